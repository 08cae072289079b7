//! First-boot network setup for a freshly flashed box.
//!
//! Runs once: the done marker in the state directory turns later runs into
//! no-ops unless `--force` is given.

mod nmcli;
mod plan;

use std::path::{Path, PathBuf};

use clap::Parser;
use hearth_core::{CommandRunner, ProcessError, SystemRunner};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use nmcli::Nmcli;

const DONE_MARKER: &str = "network-setup.done";
const MIN_PASSPHRASE_LEN: usize = 8;

/// Configure network interfaces through NetworkManager on first boot
#[derive(Parser, Debug)]
#[command(name = "hearth-network-setup")]
#[command(version)]
struct Args {
    /// Print the plan without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Run even if setup already completed
    #[arg(long)]
    force: bool,

    /// WPA passphrase for the access points created on wireless interfaces
    #[arg(long, env = "HEARTH_WIFI_PASSPHRASE", hide_env_values = true)]
    wifi_passphrase: Option<String>,

    /// Where the done marker is kept
    #[arg(long, env = "HEARTH_STATE_DIR", default_value = "/var/lib/hearth")]
    state_dir: PathBuf,

    /// NetworkManager client
    #[arg(long, env = "HEARTH_NMCLI", default_value = "nmcli")]
    nmcli: String,

    /// Show verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum SetupError {
    #[error("Wi-Fi passphrase must be at least 8 characters")]
    PassphraseTooShort,

    #[error(transparent)]
    Nmcli(#[from] ProcessError),

    #[error("Failed to write {}: {source}", .path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    AlreadyDone,
    Planned,
    Applied(usize),
}

fn done_marker(state_dir: &Path) -> PathBuf {
    state_dir.join(DONE_MARKER)
}

fn setup(args: &Args, runner: &dyn CommandRunner) -> Result<Outcome, SetupError> {
    let passphrase = args.wifi_passphrase.as_deref();
    if passphrase.is_some_and(|p| p.chars().count() < MIN_PASSPHRASE_LEN) {
        return Err(SetupError::PassphraseTooShort);
    }

    let marker = done_marker(&args.state_dir);
    if marker.exists() && !args.force {
        tracing::info!(marker = %marker.display(), "network setup already done");
        return Ok(Outcome::AlreadyDone);
    }

    let nmcli = Nmcli::new(runner, &args.nmcli);
    let devices = nmcli.devices()?;
    tracing::info!(count = devices.len(), "found network devices");
    let plan = plan::plan(&devices, passphrase.is_some());

    for (device, reason) in &plan.skipped {
        tracing::warn!(device = %device, "leaving interface unconfigured: {reason}");
    }

    if args.dry_run {
        for connection in &plan.connections {
            println!("{connection}");
        }
        for (device, reason) in &plan.skipped {
            println!("{device}: skipped ({reason})");
        }
        return Ok(Outcome::Planned);
    }

    for connection in &plan.connections {
        nmcli.add(connection, passphrase)?;
    }

    std::fs::create_dir_all(&args.state_dir)
        .and_then(|()| std::fs::write(&marker, ""))
        .map_err(|source| SetupError::Marker {
            path: marker.clone(),
            source,
        })?;
    Ok(Outcome::Applied(plan.connections.len()))
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if args.verbose {
                EnvFilter::new("info")
            } else {
                EnvFilter::new("warn")
            }
        }))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match setup(&args, &SystemRunner) {
        Ok(Outcome::Applied(count)) => {
            tracing::info!(connections = count, "network setup complete");
        }
        Ok(Outcome::AlreadyDone | Outcome::Planned) => {}
        Err(e) => {
            eprintln!("hearth-network-setup: {e}");
            std::process::exit(1);
        }
    }
}
