//! Certificate status reader.

use std::collections::BTreeMap;
use std::fs;

use hearth_core::{DomainStatus, Validity};

use crate::platform::Platform;

/// Status of every certificate in the live directory.
///
/// If the live directory cannot be listed (typically: not running as root)
/// the result is empty, so an empty map does not prove there are no
/// certificates.
pub fn get_status(platform: &Platform<'_>) -> BTreeMap<String, DomainStatus> {
    let live_dir = platform.config.paths.live_dir();
    let entries = match fs::read_dir(&live_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %live_dir.display(), error = %e, "cannot list live certificates");
            return BTreeMap::new();
        }
    };

    let mut domains = BTreeMap::new();
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let Some(domain) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let status = domain_status(platform, &domain);
        domains.insert(domain, status);
    }
    domains
}

/// Status of a single domain's certificate.
pub fn domain_status(platform: &Platform<'_>, domain: &str) -> DomainStatus {
    let available = platform.config.paths.certificate_dir(domain).is_dir();
    if !available {
        return DomainStatus {
            certificate_available: false,
            expiry_date: None,
            web_enabled: platform.web().is_site_enabled(domain),
            validity: Validity::Unknown,
        };
    }

    let certbot = platform.certbot();
    let expiry_date = certbot.expiry_date(domain).unwrap_or_else(|e| {
        tracing::warn!(domain, error = %e, "could not read certificate end date");
        None
    });
    let validity = certbot.validity(domain).unwrap_or_else(|e| {
        tracing::warn!(domain, error = %e, "could not query certificate validity");
        Validity::Unknown
    });

    DomainStatus {
        certificate_available: true,
        expiry_date,
        web_enabled: platform.web().is_site_enabled(domain),
        validity,
    }
}
