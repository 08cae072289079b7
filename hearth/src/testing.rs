//! Test doubles shared by the unit tests.

use std::cell::RefCell;
use std::path::Path;

use hearth_core::{CommandOutput, CommandRunner, ProcessError};
use tempfile::TempDir;

use crate::config::{HearthToml, PathsConfig, ProgramsConfig};

type Handler = Box<dyn Fn(&str, &[String]) -> CommandOutput>;

/// Records every command instead of spawning it.
pub(crate) struct FakeRunner {
    calls: RefCell<Vec<(String, Vec<String>)>>,
    handler: Handler,
}

impl FakeRunner {
    pub fn new(handler: impl Fn(&str, &[String]) -> CommandOutput + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    /// Every command exits 0 with empty output.
    pub fn succeeding() -> Self {
        Self::new(|program, _| CommandOutput::new(program, Some(0)))
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(program, args)| {
                std::iter::once(program)
                    .chain(args)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        self.calls
            .borrow_mut()
            .push((program.to_string(), args.to_vec()));
        Ok((self.handler)(program, args))
    }
}

/// A throwaway box layout under a temp dir.
pub(crate) struct TestBox {
    pub dir: TempDir,
    pub config: HearthToml,
}

impl TestBox {
    pub fn new(domain: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let paths = PathsConfig {
            letsencrypt_dir: root.join("letsencrypt"),
            sites_available: root.join("sites-available"),
            sites_enabled: root.join("sites-enabled"),
            webroot: root.join("www"),
            actions_dir: root.join("actions"),
        };
        for path in [
            paths.live_dir(),
            paths.letsencrypt_dir.join("renewal"),
            paths.sites_available.clone(),
            paths.sites_enabled.clone(),
            paths.actions_dir.clone(),
        ] {
            std::fs::create_dir_all(path).unwrap();
        }

        let config = HearthToml {
            domain: domain.map(str::to_string),
            modules: vec!["ejabberd".to_string(), "matrixsynapse".to_string()],
            paths,
            programs: ProgramsConfig {
                hook: Some(root.join("bin").join("hearth-letsencrypt")),
                ..ProgramsConfig::default()
            },
        };
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create `live/<domain>/` with placeholder certificate files.
    pub fn add_certificate(&self, domain: &str) {
        let dir = self.config.paths.certificate_dir(domain);
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["cert.pem", "chain.pem", "fullchain.pem", "privkey.pem"] {
            std::fs::write(dir.join(name), "placeholder\n").unwrap();
        }
    }

    pub fn write_renewal_config(&self, domain: &str, content: &str) {
        std::fs::write(self.config.paths.renewal_file(domain), content).unwrap();
    }

    pub fn hook_program(&self) -> String {
        self.config.hook_program().unwrap()
    }
}

/// A renewal file as certbot writes it after a webroot issuance.
pub(crate) fn certbot_renewal_config(domain: &str) -> String {
    format!(
        "# renew_before_expiry = 30 days
version = 2.1.0
archive_dir = /etc/letsencrypt/archive/{domain}
cert = /etc/letsencrypt/live/{domain}/cert.pem
privkey = /etc/letsencrypt/live/{domain}/privkey.pem
chain = /etc/letsencrypt/live/{domain}/chain.pem
fullchain = /etc/letsencrypt/live/{domain}/fullchain.pem

# Options used in the renewal process
[renewalparams]
account = 0123456789abcdef
authenticator = standalone
server = https://acme-v02.api.letsencrypt.org/directory
key_type = ecdsa
"
    )
}

/// certbot `certificates` output for a single certificate.
pub(crate) fn certificates_output(domain: &str, validity: &str) -> String {
    format!(
        "Saving debug log to /var/log/letsencrypt/letsencrypt.log

- - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
Found the following certs:
  Certificate Name: {domain}
    Serial Number: 3f1a2b
    Key Type: ECDSA
    Domains: {domain}
    Expiry Date: 2030-06-11 12:00:00+00:00 ({validity})
    Certificate Path: /etc/letsencrypt/live/{domain}/fullchain.pem
    Private Key Path: /etc/letsencrypt/live/{domain}/privkey.pem
- - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
"
    )
}
