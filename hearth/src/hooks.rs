//! Handlers certbot invokes around a renewal.
//!
//! Every handler first checks that the requested domain is the box's current
//! domain; a failed check spawns nothing.

use hearth_core::ProcessError;
use thiserror::Error;

use crate::actions::ActionError;
use crate::config::HearthToml;
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("No domain given")]
    MissingDomain,

    #[error("Domain '{requested}' is not the current domain ({})", .current.as_deref().unwrap_or("none configured"))]
    DomainMismatch {
        requested: String,
        current: Option<String>,
    },

    #[error("{} renewal step(s) failed:\n{}", .0.len(), format_failures(.0))]
    Renewal(Vec<RenewFailure>),
}

impl HookError {
    pub fn exit_code(&self) -> i32 {
        match self {
            HookError::MissingDomain => 1,
            HookError::DomainMismatch { .. } => 2,
            HookError::Renewal(failures) => {
                failures.first().map(RenewFailure::exit_code).unwrap_or(1)
            }
        }
    }
}

/// One failed step of the renew hook.
#[derive(Debug, Error)]
pub enum RenewFailure {
    #[error("Failed to restart {service}: {source}")]
    Restart {
        service: String,
        #[source]
        source: ProcessError,
    },

    #[error(transparent)]
    Action(#[from] ActionError),
}

impl RenewFailure {
    pub fn exit_code(&self) -> i32 {
        match self {
            RenewFailure::Restart { source, .. } => source.exit_code(),
            RenewFailure::Action(e) => e.exit_code(),
        }
    }
}

fn format_failures(failures: &[RenewFailure]) -> String {
    failures
        .iter()
        .map(|failure| match failure {
            RenewFailure::Restart { service, .. } => format!("  {service}: {failure}"),
            RenewFailure::Action(e) => format!("  {}: {e}", e.action()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The requested domain, provided it is the configured current domain.
pub fn check_domain<'a>(
    config: &HearthToml,
    requested: Option<&'a str>,
) -> Result<&'a str, HookError> {
    let requested = requested
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or(HookError::MissingDomain)?;
    let current = config.current_domain();
    if current != Some(requested) {
        return Err(HookError::DomainMismatch {
            requested: requested.to_string(),
            current: current.map(str::to_string),
        });
    }
    Ok(requested)
}

pub fn run_pre_hooks(platform: &Platform<'_>, domain: Option<&str>) -> Result<(), HookError> {
    let domain = check_domain(&platform.config, domain)?;
    tracing::info!(domain, "pre-renewal hooks: nothing to run");
    Ok(())
}

pub fn run_post_hooks(platform: &Platform<'_>, domain: Option<&str>) -> Result<(), HookError> {
    let domain = check_domain(&platform.config, domain)?;
    tracing::info!(domain, "post-renewal hooks: nothing to run");
    Ok(())
}

/// Restart the web server, then let every named module pick up the new
/// certificate. Every step runs even if an earlier one fails.
pub fn run_renew_hooks(
    platform: &Platform<'_>,
    domain: Option<&str>,
    modules: &[String],
) -> Result<(), HookError> {
    let domain = check_domain(&platform.config, domain)?;
    let mut failures = Vec::new();

    let service = &platform.config.programs.web_service;
    let services = platform.services();
    if services.is_running(service)
        && let Err(source) = services.restart(service)
    {
        tracing::warn!(service = %service, error = %source, "web server restart failed");
        failures.push(RenewFailure::Restart {
            service: service.clone(),
            source,
        });
    }

    let args = vec![
        "letsencrypt".to_string(),
        "add".to_string(),
        "--domain".to_string(),
        domain.to_string(),
    ];
    let actions = platform.actions();
    for module in modules {
        match actions.run(module, &args) {
            Ok(_) => tracing::info!(module = %module, domain, "module picked up certificate"),
            Err(e) => {
                tracing::warn!(module = %module, error = %e, "module action failed");
                failures.push(RenewFailure::Action(e));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(HookError::Renewal(failures))
    }
}
