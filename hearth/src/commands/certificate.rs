//! `get-status`, `obtain`, `revoke` and `delete`.

use std::path::PathBuf;

use hearth_core::{ProcessError, StatusReport};
use thiserror::Error;

use crate::output;
use crate::platform::{Context, Platform};
use crate::status;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("{0}")]
    Client(#[source] ProcessError),

    #[error("Failed to write site config {}: {source}", .path.display())]
    Site {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to update web server site: {0}")]
    WebServer(#[source] ProcessError),

    #[error("Failed to reload web server: {0}")]
    Reload(#[source] ProcessError),
}

pub fn get_status(ctx: &Context<'_>) -> Result<(), super::CommandError> {
    let platform = ctx.platform()?;
    let report = StatusReport {
        domains: status::get_status(&platform),
    };
    output::json(&report)?;
    Ok(())
}

pub fn obtain(ctx: &Context<'_>, domain: &str) -> Result<(), super::CommandError> {
    let platform = ctx.platform()?;
    announce(ctx, "Obtaining certificate for", domain);

    platform
        .certbot()
        .obtain(domain)
        .map_err(CertificateError::Client)?;

    let web = platform.web();
    let written = web
        .setup_site(domain)
        .map_err(|source| CertificateError::Site {
            path: platform.config.paths.site_config_file(domain),
            source,
        })?;
    if !written {
        output::warning("Existing site config left unchanged");
    }
    web.enable_site(domain)
        .map_err(CertificateError::WebServer)?;
    reload(&platform)?;

    output::success(&format!(
        "Certificate for {} is installed",
        output::emphasized(domain)
    ));
    Ok(())
}

pub fn revoke(ctx: &Context<'_>, domain: &str) -> Result<(), super::CommandError> {
    let platform = ctx.platform()?;
    announce(ctx, "Revoking certificate for", domain);

    platform
        .certbot()
        .revoke(domain)
        .map_err(CertificateError::Client)?;
    retire_site(&platform, domain)?;

    output::success(&format!(
        "Certificate for {} revoked",
        output::emphasized(domain)
    ));
    Ok(())
}

pub fn delete(ctx: &Context<'_>, domain: &str) -> Result<(), super::CommandError> {
    let platform = ctx.platform()?;
    announce(ctx, "Deleting certificate for", domain);

    platform
        .certbot()
        .delete(domain)
        .map_err(CertificateError::Client)?;
    retire_site(&platform, domain)?;

    output::success(&format!(
        "Certificate for {} deleted",
        output::emphasized(domain)
    ));
    Ok(())
}

fn announce(ctx: &Context<'_>, action: &str, domain: &str) {
    output::step(&format!("{action} {}", output::emphasized(domain)));
    if output::is_verbose() {
        output::muted(&format!("config: {}", ctx.config_path().display()));
    }
}

/// Disable the site if it is enabled; a site that was never set up is fine.
fn retire_site(platform: &Platform<'_>, domain: &str) -> Result<(), CertificateError> {
    let web = platform.web();
    if web.is_site_enabled(domain) {
        web.disable_site(domain)
            .map_err(CertificateError::WebServer)?;
    } else {
        tracing::info!(domain, "site not enabled, nothing to disable");
    }
    reload(platform)
}

fn reload(platform: &Platform<'_>) -> Result<(), CertificateError> {
    platform
        .reload_web_server()
        .map_err(CertificateError::Reload)
}
