//! Apache virtual host for the box's certificate.

use std::fs;
use std::io;
use std::path::Path;

use hearth_core::{CommandRunner, ProcessError};

use crate::config::{PathsConfig, ProgramsConfig, site_name};

const SITE_TEMPLATE: &str = r#"<IfModule mod_ssl.c>
<VirtualHost _default_:443>
	ServerAdmin webmaster@localhost
	ServerName {domain}
	DocumentRoot {webroot}

	<Directory {webroot}>
		Options FollowSymLinks
		AllowOverride None
	</Directory>

	ErrorLog ${APACHE_LOG_DIR}/error.log
	CustomLog ${APACHE_LOG_DIR}/access.log combined

	SSLEngine on
	SSLCertificateFile {live}/{domain}/fullchain.pem
	SSLCertificateKeyFile {live}/{domain}/privkey.pem
	SSLCertificateChainFile {live}/{domain}/chain.pem
</VirtualHost>
</IfModule>
"#;

/// Render the virtual host for `domain`.
pub fn render_site_config(domain: &str, live_dir: &Path, webroot: &Path) -> String {
    SITE_TEMPLATE
        .replace("{live}", &live_dir.to_string_lossy())
        .replace("{webroot}", &webroot.to_string_lossy())
        .replace("{domain}", domain)
}

pub struct Apache<'a> {
    runner: &'a dyn CommandRunner,
    programs: &'a ProgramsConfig,
    paths: &'a PathsConfig,
}

impl<'a> Apache<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        programs: &'a ProgramsConfig,
        paths: &'a PathsConfig,
    ) -> Self {
        Self {
            runner,
            programs,
            paths,
        }
    }

    /// Write the site config unless one already exists.
    ///
    /// Returns `true` when a file was written.
    pub fn setup_site(&self, domain: &str) -> io::Result<bool> {
        let path = self.paths.site_config_file(domain);
        if path.exists() {
            tracing::debug!(path = %path.display(), "site config already present");
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = render_site_config(domain, &self.paths.live_dir(), &self.paths.webroot);
        fs::write(&path, content)?;
        tracing::info!(path = %path.display(), "wrote site config");
        Ok(true)
    }

    pub fn enable_site(&self, domain: &str) -> Result<(), ProcessError> {
        self.toggle(&self.programs.a2ensite, domain)
    }

    pub fn disable_site(&self, domain: &str) -> Result<(), ProcessError> {
        self.toggle(&self.programs.a2dissite, domain)
    }

    pub fn is_site_enabled(&self, domain: &str) -> bool {
        self.paths.site_enabled_file(domain).exists()
    }

    fn toggle(&self, program: &str, domain: &str) -> Result<(), ProcessError> {
        let args = vec!["--quiet".to_string(), site_name(domain)];
        self.runner.run(program, &args)?.into_success().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRunner, TestBox};

    #[test]
    fn template_substitutes_domain_in_four_places() {
        let content = render_site_config(
            "box.example.org",
            Path::new("/etc/letsencrypt/live"),
            Path::new("/var/www/html"),
        );
        assert_eq!(content.matches("box.example.org").count(), 4);
        assert!(content.contains("ServerName box.example.org\n"));
        assert!(content.contains(
            "SSLCertificateFile /etc/letsencrypt/live/box.example.org/fullchain.pem"
        ));
        assert!(content.contains(
            "SSLCertificateKeyFile /etc/letsencrypt/live/box.example.org/privkey.pem"
        ));
        assert!(content.contains("${APACHE_LOG_DIR}/error.log"));
    }

    #[test]
    fn setup_site_is_idempotent() {
        let test_box = TestBox::new(Some("box.example.org"));
        let runner = FakeRunner::succeeding();
        let apache = Apache::new(&runner, &test_box.config.programs, &test_box.config.paths);
        let path = test_box.config.paths.site_config_file("box.example.org");

        assert!(apache.setup_site("box.example.org").unwrap());
        let first = fs::read(&path).unwrap();

        assert!(!apache.setup_site("box.example.org").unwrap());
        assert_eq!(fs::read(&path).unwrap(), first);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn setup_site_never_overwrites_existing_file() {
        let test_box = TestBox::new(Some("box.example.org"));
        let runner = FakeRunner::succeeding();
        let apache = Apache::new(&runner, &test_box.config.programs, &test_box.config.paths);
        let path = test_box.config.paths.site_config_file("box.example.org");
        fs::write(&path, "# hand edited\n").unwrap();

        assert!(!apache.setup_site("box.example.org").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# hand edited\n");
    }

    #[test]
    fn enable_and_disable_use_site_name() {
        let test_box = TestBox::new(Some("box.example.org"));
        let runner = FakeRunner::succeeding();
        let apache = Apache::new(&runner, &test_box.config.programs, &test_box.config.paths);

        apache.enable_site("box.example.org").unwrap();
        apache.disable_site("box.example.org").unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "a2ensite --quiet box.example.org-hearth",
                "a2dissite --quiet box.example.org-hearth",
            ]
        );
    }

    #[test]
    fn enabled_state_follows_sites_enabled() {
        let test_box = TestBox::new(Some("box.example.org"));
        let runner = FakeRunner::succeeding();
        let apache = Apache::new(&runner, &test_box.config.programs, &test_box.config.paths);

        assert!(!apache.is_site_enabled("box.example.org"));
        fs::write(
            test_box.config.paths.site_enabled_file("box.example.org"),
            "",
        )
        .unwrap();
        assert!(apache.is_site_enabled("box.example.org"));
    }
}
