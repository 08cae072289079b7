//! Hearth Core - Shared types and subprocess plumbing
//!
//! This crate holds the record types printed by the admin helpers
//! (`hearth-letsencrypt`, `hearth-network-setup`) and the subprocess
//! invoker they use to drive external privileged tools.
//!
//! Anything that knows about a specific tool (certbot, Apache, nmcli)
//! lives in the `hearth` crate.

pub mod process;
mod status;

pub use process::{CommandOutput, CommandRunner, ProcessError, SystemRunner};
pub use status::*;
