//! Hook management inside a domain's renewal config.
//!
//! States, per domain:
//! - no config: certbot has not issued for the domain (we never create the file)
//! - no section: the file lacks `[renewalparams]`
//! - unmanaged: the file has no `[hearth] managed` marker
//! - managed: our hooks are installed and the original is kept in the backup

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hearth_core::HookStatus;
use thiserror::Error;

use super::document::RenewalDocument;

pub const RENEWAL_SECTION: &str = "renewalparams";
pub const WEBROOT_MAP: &str = "webroot_map";
pub const MARKER_SECTION: &str = "hearth";
pub const MARKER_KEY: &str = "managed";
pub const BACKUP_SUFFIX: &str = ".hearth-backup";

const AUTHENTICATOR: &str = "webroot";
const INSTALLER: &str = "None";
const MODULES_FLAG: &str = "--modules";

#[derive(Debug, Error)]
pub enum RenewalError {
    #[error("No renewal config at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Renewal config {} has no [renewalparams] section", .0.display())]
    MissingSection(PathBuf),

    #[error(
        "Renewal config {} carries hearth edits but the backup {} is missing; restore it manually",
        .path.display(),
        .backup.display()
    )]
    MissingBackup { path: PathBuf, backup: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Pre,
    Renew,
    Post,
}

impl HookKind {
    pub const ALL: [HookKind; 3] = [HookKind::Pre, HookKind::Renew, HookKind::Post];

    pub fn config_key(self) -> &'static str {
        match self {
            HookKind::Pre => "pre_hook",
            HookKind::Renew => "renew_hook",
            HookKind::Post => "post_hook",
        }
    }

    pub fn subcommand(self) -> &'static str {
        match self {
            HookKind::Pre => "run_pre_hooks",
            HookKind::Renew => "run_renew_hooks",
            HookKind::Post => "run_post_hooks",
        }
    }
}

/// Values the platform writes into `[renewalparams]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookSettings {
    pub domain: String,
    /// Executable invoked by the hooks.
    pub program: String,
    pub webroot: String,
}

impl HookSettings {
    /// Command line for one hook. Only the renew hook carries modules.
    pub fn command_line(&self, kind: HookKind, modules: &[String]) -> String {
        let mut line = format!("{} {} --domain {}", self.program, kind.subcommand(), self.domain);
        if kind == HookKind::Renew && !modules.is_empty() {
            line.push(' ');
            line.push_str(MODULES_FLAG);
            for module in modules {
                line.push(' ');
                line.push_str(module);
            }
        }
        line
    }

    fn expected_values(&self) -> Vec<(&'static str, String)> {
        let mut expected = vec![
            ("authenticator", AUTHENTICATOR.to_string()),
            ("installer", INSTALLER.to_string()),
        ];
        for kind in HookKind::ALL {
            expected.push((kind.config_key(), self.command_line(kind, &[])));
        }
        expected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableOutcome {
    NothingToDo,
    Restored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableOutcome {
    /// A backup of the pre-hearth file was taken by this call.
    pub backed_up: bool,
}

/// Module names following `--modules` in a hook command line, limited to
/// `known` and deduplicated in order of appearance.
pub fn modules_in_command(command: &str, known: &[String]) -> Vec<String> {
    let mut tokens = command
        .split_whitespace()
        .skip_while(|token| *token != MODULES_FLAG);
    tokens.next();

    let mut modules: Vec<String> = Vec::new();
    for token in tokens.take_while(|token| !token.starts_with("--")) {
        if known.iter().any(|k| k == token) && !modules.iter().any(|m| m == token) {
            modules.push(token.to_string());
        }
    }
    modules
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn is_managed(doc: &RenewalDocument) -> bool {
    doc.get(MARKER_SECTION, MARKER_KEY)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Write the edited config. If that fails, a backup taken for this edit is
/// removed so the file is not left looking half-managed.
fn write_edited(path: &Path, contents: &str, backup: Option<&Path>) -> Result<(), RenewalError> {
    let Err(source) = fs::write(path, contents) else {
        return Ok(());
    };
    if let Some(backup) = backup
        && let Err(e) = fs::remove_file(backup)
    {
        tracing::warn!(backup = %backup.display(), error = %e, "failed to remove backup");
    }
    Err(RenewalError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// One domain's renewal config on disk.
#[derive(Debug, Clone)]
pub struct RenewalFile {
    path: PathBuf,
}

impl RenewalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        backup_path(&self.path)
    }

    fn load(&self) -> Result<Option<RenewalDocument>, RenewalError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(RenewalDocument::parse(&content))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RenewalError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Install the platform's hooks.
    pub fn enable(
        &self,
        settings: &HookSettings,
        modules: &[String],
    ) -> Result<EnableOutcome, RenewalError> {
        let mut doc = self
            .load()?
            .ok_or_else(|| RenewalError::NotFound(self.path.clone()))?;
        if !doc.has_section(RENEWAL_SECTION) {
            return Err(RenewalError::MissingSection(self.path.clone()));
        }

        let backup = (!is_managed(&doc)).then(|| self.backup_path());
        if let Some(backup) = &backup {
            fs::copy(&self.path, backup).map_err(|source| RenewalError::Write {
                path: backup.clone(),
                source,
            })?;
            tracing::info!(backup = %backup.display(), "backed up renewal config");
        }

        doc.set(RENEWAL_SECTION, "authenticator", AUTHENTICATOR);
        doc.replace_subsection(
            RENEWAL_SECTION,
            WEBROOT_MAP,
            &[(settings.domain.as_str(), settings.webroot.as_str())],
        );
        doc.set(RENEWAL_SECTION, "installer", INSTALLER);
        for kind in HookKind::ALL {
            doc.set(
                RENEWAL_SECTION,
                kind.config_key(),
                &settings.command_line(kind, modules),
            );
        }
        doc.set(MARKER_SECTION, MARKER_KEY, "True");

        write_edited(&self.path, &doc.render(), backup.as_deref())?;
        tracing::info!(path = %self.path.display(), ?modules, "renewal hooks enabled");
        Ok(EnableOutcome {
            backed_up: backup.is_some(),
        })
    }

    /// Put the pre-hearth file back.
    pub fn disable(&self) -> Result<DisableOutcome, RenewalError> {
        let Some(doc) = self.load()? else {
            return Ok(DisableOutcome::NothingToDo);
        };
        if !is_managed(&doc) {
            return Ok(DisableOutcome::NothingToDo);
        }

        let backup = self.backup_path();
        if !backup.is_file() {
            return Err(RenewalError::MissingBackup {
                path: self.path.clone(),
                backup,
            });
        }
        fs::rename(&backup, &self.path).map_err(|source| RenewalError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "renewal config restored from backup");
        Ok(DisableOutcome::Restored)
    }

    /// Classify the live `[renewalparams]` against what `enable` writes.
    pub fn status(
        &self,
        settings: &HookSettings,
        known_modules: &[String],
    ) -> Result<HookStatus, RenewalError> {
        let Some(doc) = self.load()? else {
            return Ok(HookStatus::disabled());
        };
        if !doc.has_section(RENEWAL_SECTION) {
            return Ok(HookStatus::disabled());
        }

        for (key, expected) in settings.expected_values() {
            let matches = doc
                .get(RENEWAL_SECTION, key)
                .is_some_and(|live| live.contains(&expected));
            if !matches {
                tracing::debug!(key, expected = %expected, "renewal param differs");
                return Ok(HookStatus::disabled());
            }
        }

        let webroot_mapped = doc
            .subsection_entries(RENEWAL_SECTION, WEBROOT_MAP)
            .iter()
            .any(|(domain, path)| *domain == settings.domain && path.contains(&settings.webroot));
        if !webroot_mapped {
            return Ok(HookStatus::disabled());
        }

        let renew_hook = doc
            .get(RENEWAL_SECTION, HookKind::Renew.config_key())
            .unwrap_or_default();
        Ok(HookStatus::enabled(modules_in_command(
            renew_hook,
            known_modules,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestBox, certbot_renewal_config};
    use hearth_core::HookState;

    const DOMAIN: &str = "box.example.org";

    fn settings(test_box: &TestBox) -> HookSettings {
        HookSettings {
            domain: DOMAIN.to_string(),
            program: test_box.hook_program(),
            webroot: test_box.config.paths.webroot.to_string_lossy().to_string(),
        }
    }

    fn renewal_file(test_box: &TestBox) -> RenewalFile {
        RenewalFile::new(test_box.config.paths.renewal_file(DOMAIN))
    }

    #[test]
    fn command_line_adds_modules_to_renew_hook_only() {
        let settings = HookSettings {
            domain: DOMAIN.to_string(),
            program: "/usr/bin/hearth-letsencrypt".to_string(),
            webroot: "/var/www/html".to_string(),
        };
        let modules = vec!["ejabberd".to_string(), "matrixsynapse".to_string()];

        assert_eq!(
            settings.command_line(HookKind::Pre, &modules),
            "/usr/bin/hearth-letsencrypt run_pre_hooks --domain box.example.org"
        );
        assert_eq!(
            settings.command_line(HookKind::Renew, &modules),
            "/usr/bin/hearth-letsencrypt run_renew_hooks --domain box.example.org --modules ejabberd matrixsynapse"
        );
        assert_eq!(
            settings.command_line(HookKind::Post, &modules),
            "/usr/bin/hearth-letsencrypt run_post_hooks --domain box.example.org"
        );
    }

    #[test]
    fn modules_in_command_matches_known_tokens_only() {
        let known = vec!["ejabberd".to_string(), "matrixsynapse".to_string()];
        assert_eq!(
            modules_in_command("x run_renew_hooks --domain d --modules ejabberd", &known),
            vec!["ejabberd"]
        );
        assert_eq!(
            modules_in_command(
                "x run_renew_hooks --modules matrixsynapse other ejabberd ejabberd --domain d",
                &known
            ),
            vec!["matrixsynapse", "ejabberd"]
        );
        // A module name elsewhere in the line is not a module argument.
        assert!(modules_in_command("/opt/ejabberd/bin/x run_renew_hooks", &known).is_empty());
    }

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/etc/letsencrypt/renewal/a.org.conf")),
            PathBuf::from("/etc/letsencrypt/renewal/a.org.conf.hearth-backup")
        );
    }

    #[test]
    fn enable_then_status_reports_enabled_with_modules() {
        let test_box = TestBox::new(Some(DOMAIN));
        test_box.write_renewal_config(DOMAIN, &certbot_renewal_config(DOMAIN));
        let file = renewal_file(&test_box);
        let modules = vec!["matrixsynapse".to_string()];

        let outcome = file.enable(&settings(&test_box), &modules).unwrap();
        assert!(outcome.backed_up);

        let status = file
            .status(&settings(&test_box), &test_box.config.modules)
            .unwrap();
        assert_eq!(status.status, HookState::Enabled);
        assert_eq!(status.modules, modules);
    }

    #[test]
    fn enable_without_modules_reports_empty_module_list() {
        let test_box = TestBox::new(Some(DOMAIN));
        test_box.write_renewal_config(DOMAIN, &certbot_renewal_config(DOMAIN));
        let file = renewal_file(&test_box);

        file.enable(&settings(&test_box), &[]).unwrap();
        let status = file
            .status(&settings(&test_box), &test_box.config.modules)
            .unwrap();
        assert_eq!(status, HookStatus::enabled(Vec::new()));
    }

    #[test]
    fn enable_writes_webroot_and_hooks() {
        let test_box = TestBox::new(Some(DOMAIN));
        test_box.write_renewal_config(DOMAIN, &certbot_renewal_config(DOMAIN));
        let file = renewal_file(&test_box);
        let settings = settings(&test_box);

        file.enable(&settings, &["ejabberd".to_string()]).unwrap();
        let content = fs::read_to_string(file.path()).unwrap();
        let doc = RenewalDocument::parse(&content);

        assert_eq!(doc.get(RENEWAL_SECTION, "authenticator"), Some("webroot"));
        assert_eq!(doc.get(RENEWAL_SECTION, "installer"), Some("None"));
        assert_eq!(doc.get(RENEWAL_SECTION, "account"), Some("0123456789abcdef"));
        assert_eq!(
            doc.subsection_entries(RENEWAL_SECTION, WEBROOT_MAP),
            vec![(DOMAIN.to_string(), settings.webroot.clone())]
        );
        assert!(
            doc.get(RENEWAL_SECTION, "pre_hook")
                .unwrap()
                .ends_with("run_pre_hooks --domain box.example.org")
        );
        assert!(
            doc.get(RENEWAL_SECTION, "renew_hook")
                .unwrap()
                .ends_with("--modules ejabberd")
        );
        assert_eq!(doc.get(MARKER_SECTION, MARKER_KEY), Some("True"));
        assert!(content.starts_with("# renew_before_expiry = 30 days\n"));
    }

    #[test]
    fn repeated_enable_keeps_original_backup() {
        let test_box = TestBox::new(Some(DOMAIN));
        let original = certbot_renewal_config(DOMAIN);
        test_box.write_renewal_config(DOMAIN, &original);
        let file = renewal_file(&test_box);

        assert!(file.enable(&settings(&test_box), &[]).unwrap().backed_up);
        let second = file
            .enable(&settings(&test_box), &["ejabberd".to_string()])
            .unwrap();
        assert!(!second.backed_up);
        assert_eq!(fs::read_to_string(file.backup_path()).unwrap(), original);

        let status = file
            .status(&settings(&test_box), &test_box.config.modules)
            .unwrap();
        assert_eq!(status.modules, vec!["ejabberd"]);
    }

    #[test]
    fn failed_write_drops_the_fresh_backup() {
        let test_box = TestBox::new(Some(DOMAIN));
        let target = test_box.root().join("not-a-file");
        fs::create_dir(&target).unwrap();
        let backup = backup_path(&target);
        fs::write(&backup, "original\n").unwrap();

        let err = write_edited(&target, "edited\n", Some(&backup)).unwrap_err();
        assert!(matches!(err, RenewalError::Write { .. }));
        assert!(!backup.exists());
        assert!(target.is_dir());
    }

    #[test]
    fn failed_write_keeps_backup_it_did_not_take() {
        let test_box = TestBox::new(Some(DOMAIN));
        let target = test_box.root().join("not-a-file");
        fs::create_dir(&target).unwrap();
        let backup = backup_path(&target);
        fs::write(&backup, "original\n").unwrap();

        write_edited(&target, "edited\n", None).unwrap_err();
        assert_eq!(fs::read_to_string(&backup).unwrap(), "original\n");
    }

    #[test]
    fn enable_then_disable_restores_exact_bytes() {
        let test_box = TestBox::new(Some(DOMAIN));
        let original = format!("{}  \n# trailing comment", certbot_renewal_config(DOMAIN));
        test_box.write_renewal_config(DOMAIN, &original);
        let file = renewal_file(&test_box);

        file.enable(&settings(&test_box), &["ejabberd".to_string()])
            .unwrap();
        assert_ne!(fs::read_to_string(file.path()).unwrap(), original);

        assert_eq!(file.disable().unwrap(), DisableOutcome::Restored);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), original);
        assert!(!file.backup_path().exists());
    }

    #[test]
    fn disable_without_enable_is_noop() {
        let test_box = TestBox::new(Some(DOMAIN));
        let original = certbot_renewal_config(DOMAIN);
        test_box.write_renewal_config(DOMAIN, &original);
        let file = renewal_file(&test_box);

        assert_eq!(file.disable().unwrap(), DisableOutcome::NothingToDo);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), original);
    }

    #[test]
    fn disable_without_config_is_noop() {
        let test_box = TestBox::new(Some(DOMAIN));
        assert_eq!(
            renewal_file(&test_box).disable().unwrap(),
            DisableOutcome::NothingToDo
        );
    }

    #[test]
    fn disable_with_missing_backup_leaves_file_untouched() {
        let test_box = TestBox::new(Some(DOMAIN));
        test_box.write_renewal_config(DOMAIN, &certbot_renewal_config(DOMAIN));
        let file = renewal_file(&test_box);
        file.enable(&settings(&test_box), &[]).unwrap();
        fs::remove_file(file.backup_path()).unwrap();
        let edited = fs::read_to_string(file.path()).unwrap();

        let err = file.disable().unwrap_err();
        assert!(matches!(err, RenewalError::MissingBackup { .. }));
        assert_eq!(fs::read_to_string(file.path()).unwrap(), edited);
    }

    #[test]
    fn enable_requires_config_and_section() {
        let test_box = TestBox::new(Some(DOMAIN));
        let file = renewal_file(&test_box);

        let err = file.enable(&settings(&test_box), &[]).unwrap_err();
        assert!(matches!(err, RenewalError::NotFound(_)));

        test_box.write_renewal_config(DOMAIN, "version = 2.1.0\n");
        let err = file.enable(&settings(&test_box), &[]).unwrap_err();
        assert!(matches!(err, RenewalError::MissingSection(_)));
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "version = 2.1.0\n"
        );
        assert!(!file.backup_path().exists());
    }

    #[test]
    fn status_is_disabled_for_untouched_or_missing_config() {
        let test_box = TestBox::new(Some(DOMAIN));
        let file = renewal_file(&test_box);
        assert_eq!(
            file.status(&settings(&test_box), &test_box.config.modules)
                .unwrap(),
            HookStatus::disabled()
        );

        test_box.write_renewal_config(DOMAIN, &certbot_renewal_config(DOMAIN));
        assert_eq!(
            file.status(&settings(&test_box), &test_box.config.modules)
                .unwrap(),
            HookStatus::disabled()
        );
    }

    #[test]
    fn status_is_disabled_when_a_hook_was_changed_by_hand() {
        let test_box = TestBox::new(Some(DOMAIN));
        test_box.write_renewal_config(DOMAIN, &certbot_renewal_config(DOMAIN));
        let file = renewal_file(&test_box);
        file.enable(&settings(&test_box), &[]).unwrap();

        let mut doc = RenewalDocument::parse(&fs::read_to_string(file.path()).unwrap());
        doc.set(RENEWAL_SECTION, "post_hook", "systemctl reload nginx");
        fs::write(file.path(), doc.render()).unwrap();

        assert_eq!(
            file.status(&settings(&test_box), &test_box.config.modules)
                .unwrap(),
            HookStatus::disabled()
        );
    }
}
