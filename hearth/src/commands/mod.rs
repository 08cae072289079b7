pub mod certificate;
pub mod manage_hooks;

use thiserror::Error;

use crate::config::ConfigError;
use crate::hooks::HookError;
use certificate::CertificateError;
use manage_hooks::ManageHooksError;

/// Failure of a top-level command, carrying its process exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    ManageHooks(#[from] ManageHooksError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("Failed to write JSON output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CommandError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::ManageHooks(e) => e.exit_code(),
            CommandError::Hook(e) => e.exit_code(),
            CommandError::Config(_) | CommandError::Certificate(_) | CommandError::Output(_) => 1,
        }
    }
}
