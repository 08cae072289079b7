//! Status records printed as JSON by `hearth-letsencrypt`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Validity of a certificate as reported by the certificate client.
///
/// Serialized as a bare lower-case string. Reasons the client reports that
/// are not one of the well-known ones are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Validity {
    Valid,
    Revoked,
    Expired,
    Unknown,
    Other(String),
}

impl Validity {
    /// Map an `INVALID: <reason>` reason to a validity value.
    pub fn from_reason(reason: &str) -> Self {
        Validity::from(reason.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Validity::Valid => "valid",
            Validity::Revoked => "revoked",
            Validity::Expired => "expired",
            Validity::Unknown => "unknown",
            Validity::Other(reason) => reason,
        }
    }
}

impl From<String> for Validity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "valid" => Validity::Valid,
            "revoked" => Validity::Revoked,
            "expired" => Validity::Expired,
            "unknown" | "" => Validity::Unknown,
            _ => Validity::Other(value),
        }
    }
}

impl From<Validity> for String {
    fn from(value: Validity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-domain certificate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStatus {
    pub certificate_available: bool,
    /// End date as printed by the end-date query; `None` when unreadable.
    pub expiry_date: Option<String>,
    pub web_enabled: bool,
    pub validity: Validity,
}

/// Output of `get-status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub domains: BTreeMap<String, DomainStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookState {
    Enabled,
    Disabled,
}

/// Output of `manage_hooks status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookStatus {
    pub status: HookState,
    /// Dependent modules named in the renew hook. Always empty when disabled.
    #[serde(default)]
    pub modules: Vec<String>,
}

impl HookStatus {
    pub fn disabled() -> Self {
        Self {
            status: HookState::Disabled,
            modules: Vec::new(),
        }
    }

    pub fn enabled(modules: Vec<String>) -> Self {
        Self {
            status: HookState::Enabled,
            modules,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.status == HookState::Enabled
    }
}
