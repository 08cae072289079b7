//! Subprocess invoker.
//!
//! Programs are always started with an explicit argument vector through
//! [`std::process::Command`]; nothing here ever goes through a shell, so a
//! domain or module name can never be interpreted as shell syntax.

use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({}): {}", describe_code(.code), .stderr.trim())]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl ProcessError {
    /// Exit code to propagate for this failure. Signals and spawn
    /// failures map to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcessError::NonZeroExit {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            ProcessError::NonZeroExit { stderr, .. } => stderr,
            ProcessError::Spawn { .. } => "",
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub program: String,
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(program: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            program: program.into(),
            code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`ProcessError::NonZeroExit`].
    pub fn into_success(self) -> Result<Self, ProcessError> {
        if self.success() {
            return Ok(self);
        }
        Err(ProcessError::NonZeroExit {
            program: self.program,
            code: self.code,
            stdout: self.stdout,
            stderr: self.stderr,
        })
    }
}

/// Seam for everything that spawns external tools.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        tracing::debug!(program, ?args, "running command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let result = CommandOutput {
            program: program.to_string(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success() {
            tracing::debug!(program, code = ?result.code, "command exited unsuccessfully");
        }
        Ok(result)
    }
}
