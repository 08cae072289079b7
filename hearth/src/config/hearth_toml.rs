use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::validation::{validate_domain, validate_module};

/// Suffix of the Apache site name (and site file stem) managed per domain.
pub const SITE_SUFFIX: &str = "-hearth";

/// Platform configuration (`hearth.toml`).
///
/// Loaded at the start of every command; nothing is cached between commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HearthToml {
    /// The box's current domain, if one has been configured.
    #[serde(default)]
    pub domain: Option<String>,

    /// Dependent modules that expose a `letsencrypt add` action.
    #[serde(default)]
    pub modules: Vec<String>,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub programs: ProgramsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub letsencrypt_dir: PathBuf,
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
    pub webroot: PathBuf,
    pub actions_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            letsencrypt_dir: PathBuf::from("/etc/letsencrypt"),
            sites_available: PathBuf::from("/etc/apache2/sites-available"),
            sites_enabled: PathBuf::from("/etc/apache2/sites-enabled"),
            webroot: PathBuf::from("/var/www/html"),
            actions_dir: PathBuf::from("/usr/share/hearth/actions"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProgramsConfig {
    pub certbot: String,
    pub openssl: String,
    pub a2ensite: String,
    pub a2dissite: String,
    pub systemctl: String,
    /// Program written into the renewal hooks. Defaults to the running executable.
    pub hook: Option<PathBuf>,
    pub web_service: String,
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            certbot: "certbot".to_string(),
            openssl: "openssl".to_string(),
            a2ensite: "a2ensite".to_string(),
            a2dissite: "a2dissite".to_string(),
            systemctl: "systemctl".to_string(),
            hook: None,
            web_service: "apache2".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn live_dir(&self) -> PathBuf {
        self.letsencrypt_dir.join("live")
    }

    pub fn certificate_dir(&self, domain: &str) -> PathBuf {
        self.live_dir().join(domain)
    }

    pub fn certificate_file(&self, domain: &str, name: &str) -> PathBuf {
        self.certificate_dir(domain).join(name)
    }

    pub fn renewal_file(&self, domain: &str) -> PathBuf {
        self.letsencrypt_dir
            .join("renewal")
            .join(format!("{domain}.conf"))
    }

    pub fn site_config_file(&self, domain: &str) -> PathBuf {
        self.sites_available
            .join(format!("{}.conf", site_name(domain)))
    }

    pub fn site_enabled_file(&self, domain: &str) -> PathBuf {
        self.sites_enabled.join(format!("{}.conf", site_name(domain)))
    }
}

/// Apache site name for a domain.
pub fn site_name(domain: &str) -> String {
    format!("{domain}{SITE_SUFFIX}")
}

impl HearthToml {
    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(path.as_ref().to_path_buf(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut parsed: Self = toml::from_str(content)?;
        parsed.normalize()?;
        Ok(parsed)
    }

    fn normalize(&mut self) -> Result<()> {
        self.domain = match self.domain.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(domain) => Some(
                validate_domain(domain).map_err(|e| ConfigError::Validation(e.to_string()))?,
            ),
        };

        let mut modules = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let module =
                validate_module(module).map_err(|e| ConfigError::Validation(e.to_string()))?;
            if !modules.contains(&module) {
                modules.push(module);
            }
        }
        self.modules = modules;
        Ok(())
    }

    pub fn current_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn is_known_module(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == module)
    }

    /// Program written into the renewal hook command lines.
    pub fn hook_program(&self) -> Result<String> {
        let program = match &self.programs.hook {
            Some(program) => program.clone(),
            None => std::env::current_exe()
                .and_then(|exe| exe.canonicalize())
                .map_err(|e| {
                    ConfigError::Validation(format!("Could not determine hook program: {e}"))
                })?,
        };
        let program = program.to_string_lossy().to_string();
        if program.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "Hook program path must not contain whitespace: '{program}'"
            )));
        }
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_config_uses_defaults() {
        let config = HearthToml::parse("").unwrap();
        assert_eq!(config, HearthToml::default());
        assert!(config.current_domain().is_none());
        assert_eq!(config.programs.certbot, "certbot");
        assert_eq!(
            config.paths.renewal_file("box.example.org"),
            PathBuf::from("/etc/letsencrypt/renewal/box.example.org.conf")
        );
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = HearthToml::load(&dir.path().join("hearth.toml")).unwrap();
        assert_eq!(config, HearthToml::default());
    }

    #[test]
    fn parses_domain_modules_and_overrides() {
        let config = HearthToml::parse(
            r#"
domain = "Box.Example.org"
modules = ["ejabberd", "matrixsynapse", "ejabberd"]

[paths]
letsencrypt_dir = "/tmp/le"

[programs]
certbot = "/opt/certbot/bin/certbot"
hook = "/usr/bin/hearth-letsencrypt"
"#,
        )
        .unwrap();

        assert_eq!(config.current_domain(), Some("box.example.org"));
        assert_eq!(config.modules, vec!["ejabberd", "matrixsynapse"]);
        assert_eq!(config.paths.live_dir(), PathBuf::from("/tmp/le/live"));
        assert_eq!(
            config.paths.sites_available,
            PathBuf::from("/etc/apache2/sites-available")
        );
        assert_eq!(config.programs.certbot, "/opt/certbot/bin/certbot");
        assert_eq!(config.programs.openssl, "openssl");
        assert_eq!(config.hook_program().unwrap(), "/usr/bin/hearth-letsencrypt");
    }

    #[test]
    fn blank_domain_means_no_current_domain() {
        let config = HearthToml::parse("domain = \"  \"\n").unwrap();
        assert!(config.current_domain().is_none());
    }

    #[test]
    fn rejects_invalid_domain() {
        let err = HearthToml::parse("domain = \"bad domain.org\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_invalid_module() {
        let err = HearthToml::parse("modules = [\"../x\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn site_paths_use_site_suffix() {
        let paths = PathsConfig::default();
        assert_eq!(site_name("box.example.org"), "box.example.org-hearth");
        assert_eq!(
            paths.site_config_file("box.example.org"),
            PathBuf::from("/etc/apache2/sites-available/box.example.org-hearth.conf")
        );
        assert_eq!(
            paths.site_enabled_file("box.example.org"),
            PathBuf::from("/etc/apache2/sites-enabled/box.example.org-hearth.conf")
        );
    }
}
