//! `manage_hooks enable|disable|status`.

use clap::ValueEnum;
use thiserror::Error;

use crate::config::ConfigError;
use crate::output;
use crate::platform::{Context, Platform};
use crate::renewal::{DisableOutcome, HookSettings, RenewalError, RenewalFile};
use crate::status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HookCommand {
    /// Install the platform's renewal hooks
    Enable,
    /// Restore the renewal config from the backup
    Disable,
    /// Report whether the hooks are installed
    Status,
}

#[derive(Debug, Error)]
pub enum ManageHooksError {
    #[error("Unknown module '{module}' (configured modules: {})", .known.join(", "))]
    UnknownModule { module: String, known: Vec<String> },

    #[error("No current domain is configured")]
    NoCurrentDomain,

    #[error("Domain '{requested}' is not the current domain '{current}'")]
    DomainMismatch { requested: String, current: String },

    #[error("No certificate has been issued for '{0}'")]
    NoCertificate(String),

    #[error(transparent)]
    Renewal(#[from] RenewalError),

    #[error(transparent)]
    HookProgram(#[from] ConfigError),
}

impl ManageHooksError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ManageHooksError::UnknownModule { .. } => 1,
            ManageHooksError::NoCurrentDomain => 2,
            ManageHooksError::DomainMismatch { .. } => 3,
            ManageHooksError::NoCertificate(_) => 4,
            ManageHooksError::Renewal(RenewalError::NotFound(_)) => 5,
            ManageHooksError::Renewal(RenewalError::MissingSection(_)) => 6,
            ManageHooksError::Renewal(RenewalError::MissingBackup { .. }) => 7,
            ManageHooksError::Renewal(_) | ManageHooksError::HookProgram(_) => 1,
        }
    }
}

pub fn run(
    ctx: &Context<'_>,
    command: HookCommand,
    domain: Option<&str>,
    modules: &[String],
) -> Result<(), super::CommandError> {
    let platform = ctx.platform()?;
    let domain = current_domain(&platform, domain)?;
    let file = RenewalFile::new(platform.config.paths.renewal_file(&domain));

    match command {
        HookCommand::Enable => enable(&platform, &file, &domain, modules)?,
        HookCommand::Disable => disable(&file)?,
        HookCommand::Status => {
            let settings = settings(&platform, &domain)?;
            let status = file
                .status(&settings, &platform.config.modules)
                .map_err(ManageHooksError::from)?;
            tracing::info!(
                domain = %domain,
                enabled = status.is_enabled(),
                modules = ?status.modules,
                "renewal hook status"
            );
            output::json(&status)?;
        }
    }
    Ok(())
}

/// The configured current domain, checked against `--domain` when given.
fn current_domain(
    platform: &Platform<'_>,
    requested: Option<&str>,
) -> Result<String, ManageHooksError> {
    let current = platform
        .config
        .current_domain()
        .ok_or(ManageHooksError::NoCurrentDomain)?;
    if let Some(requested) = requested
        && requested != current
    {
        return Err(ManageHooksError::DomainMismatch {
            requested: requested.to_string(),
            current: current.to_string(),
        });
    }
    Ok(current.to_string())
}

fn settings(platform: &Platform<'_>, domain: &str) -> Result<HookSettings, ManageHooksError> {
    Ok(HookSettings {
        domain: domain.to_string(),
        program: platform.config.hook_program()?,
        webroot: platform.config.paths.webroot.to_string_lossy().to_string(),
    })
}

fn enable(
    platform: &Platform<'_>,
    file: &RenewalFile,
    domain: &str,
    modules: &[String],
) -> Result<(), ManageHooksError> {
    if let Some(module) = modules.iter().find(|m| !platform.config.is_known_module(m)) {
        return Err(ManageHooksError::UnknownModule {
            module: module.clone(),
            known: platform.config.modules.clone(),
        });
    }

    let issued = status::get_status(platform)
        .get(domain)
        .is_some_and(|s| s.certificate_available);
    if !issued {
        return Err(ManageHooksError::NoCertificate(domain.to_string()));
    }

    let settings = settings(platform, domain)?;
    let outcome = file.enable(&settings, modules)?;
    if outcome.backed_up {
        output::muted(&format!("Backup: {}", file.backup_path().display()));
    }
    output::success(&format!(
        "Renewal hooks enabled for {}",
        output::emphasized(domain)
    ));
    Ok(())
}

fn disable(file: &RenewalFile) -> Result<(), ManageHooksError> {
    match file.disable()? {
        DisableOutcome::NothingToDo => output::muted("Renewal hooks not enabled, nothing to do"),
        DisableOutcome::Restored => output::success(&format!(
            "Renewal config restored: {}",
            file.path().display()
        )),
    }
    Ok(())
}
