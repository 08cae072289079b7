//! Dependent-module action invocation.
//!
//! Each dependent module ships an executable in the actions directory named
//! after the module. Actions are resolved to a canonical path that must stay
//! inside the canonical actions directory before anything is spawned.

use std::path::{Path, PathBuf};

use hearth_core::{CommandOutput, CommandRunner, ProcessError};
use thiserror::Error;

use crate::validation::validate_module;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Invalid action name '{0}'")]
    InvalidName(String),

    #[error("Action '{action}' not found in {}: {source}", .dir.display())]
    NotFound {
        action: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Action '{action}' resolves outside {}", .dir.display())]
    OutsideDirectory { action: String, dir: PathBuf },

    #[error("Action '{action}' could not be started: {source}")]
    Spawn {
        action: String,
        #[source]
        source: ProcessError,
    },

    #[error("Action '{action}' failed ({})\n{}", describe_code(.code), format_output(.stdout, .stderr))]
    Failed {
        action: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl ActionError {
    pub fn action(&self) -> &str {
        match self {
            ActionError::InvalidName(action) => action,
            ActionError::NotFound { action, .. }
            | ActionError::OutsideDirectory { action, .. }
            | ActionError::Spawn { action, .. }
            | ActionError::Failed { action, .. } => action,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ActionError::Failed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn format_output(stdout: &str, stderr: &str) -> String {
    format!("stdout: {}\nstderr: {}", stdout.trim(), stderr.trim())
}

pub struct ModuleActions<'a> {
    runner: &'a dyn CommandRunner,
    actions_dir: &'a Path,
}

impl<'a> ModuleActions<'a> {
    pub fn new(runner: &'a dyn CommandRunner, actions_dir: &'a Path) -> Self {
        Self {
            runner,
            actions_dir,
        }
    }

    /// Canonical path of `action`, guaranteed to live in the actions directory.
    pub fn resolve(&self, action: &str) -> Result<PathBuf, ActionError> {
        let action = validate_module(action)
            .map_err(|_| ActionError::InvalidName(action.to_string()))?;

        let not_found = |source| ActionError::NotFound {
            action: action.clone(),
            dir: self.actions_dir.to_path_buf(),
            source,
        };
        let dir = self.actions_dir.canonicalize().map_err(not_found)?;
        let path = dir.join(&action).canonicalize().map_err(not_found)?;

        if !path.starts_with(&dir) || !path.is_file() {
            return Err(ActionError::OutsideDirectory {
                action,
                dir: self.actions_dir.to_path_buf(),
            });
        }
        Ok(path)
    }

    pub fn run(&self, action: &str, args: &[String]) -> Result<CommandOutput, ActionError> {
        let path = self.resolve(action)?;
        tracing::info!(action, path = %path.display(), ?args, "running module action");

        let output = self
            .runner
            .run(&path.to_string_lossy(), args)
            .map_err(|source| ActionError::Spawn {
                action: action.to_string(),
                source,
            })?;
        if !output.success() {
            return Err(ActionError::Failed {
                action: action.to_string(),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}
