mod actions;
mod certbot;
mod cli;
mod commands;
mod config;
mod hooks;
mod output;
mod paths;
mod platform;
mod renewal;
mod services;
mod status;
#[cfg(test)]
mod testing;
mod validation;
mod webserver;

use clap::Parser;
use hearth_core::SystemRunner;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    // Parse CLI arguments early so we can configure logging/output.
    let cli = Cli::parse();

    crate::output::set_verbose(cli.verbose);

    // Logs go to stderr; stdout carries the JSON reports.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cli.verbose {
                EnvFilter::new("info")
            } else {
                EnvFilter::new("warn")
            }
        }))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = cli.run(&SystemRunner) {
        crate::output::error_stderr(&e.to_string());
        std::process::exit(e.exit_code());
    }
}
