use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hearth_core::CommandRunner;

use crate::commands::manage_hooks::HookCommand;
use crate::commands::{self, CommandError};
use crate::hooks;
use crate::paths;
use crate::platform::Context;
use crate::validation::{parse_domain, parse_module};

/// Hearth certificate helper: certbot, Apache sites and renewal hooks
#[derive(Parser)]
#[command(name = "hearth-letsencrypt")]
#[command(version)]
pub struct Cli {
    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Platform config file [default: $HEARTH_CONFIG or /etc/hearth/hearth.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the status of every installed certificate as JSON
    #[command(name = "get-status")]
    GetStatus,

    /// Obtain a certificate and enable its web server site
    Obtain {
        #[arg(long, value_parser = parse_domain)]
        domain: String,
    },

    /// Revoke a certificate and disable its web server site
    Revoke {
        #[arg(long, value_parser = parse_domain)]
        domain: String,
    },

    /// Delete a certificate and disable its web server site
    Delete {
        #[arg(long, value_parser = parse_domain)]
        domain: String,
    },

    /// Enable, disable or inspect the renewal hooks of the current domain
    #[command(name = "manage_hooks")]
    ManageHooks {
        #[arg(value_enum)]
        command: HookCommand,

        /// Must match the current domain when given
        #[arg(long, value_parser = parse_domain)]
        domain: Option<String>,

        /// Dependent modules to notify after renewal
        #[arg(long, num_args = 1.., value_parser = parse_module)]
        modules: Vec<String>,
    },

    /// Certbot pre-renewal hook
    #[command(name = "run_pre_hooks")]
    RunPreHooks {
        #[arg(long, value_parser = parse_domain)]
        domain: Option<String>,
    },

    /// Certbot renewal hook: restart the web server and notify modules
    #[command(name = "run_renew_hooks")]
    RunRenewHooks {
        #[arg(long, value_parser = parse_domain)]
        domain: Option<String>,

        #[arg(long, num_args = 1.., value_parser = parse_module)]
        modules: Vec<String>,
    },

    /// Certbot post-renewal hook
    #[command(name = "run_post_hooks")]
    RunPostHooks {
        #[arg(long, value_parser = parse_domain)]
        domain: Option<String>,
    },
}

impl Cli {
    pub fn run(self, runner: &dyn CommandRunner) -> Result<(), CommandError> {
        let ctx = Context::new(paths::config_path(self.config.as_deref()), runner);

        match self.command {
            Commands::GetStatus => commands::certificate::get_status(&ctx),
            Commands::Obtain { domain } => commands::certificate::obtain(&ctx, &domain),
            Commands::Revoke { domain } => commands::certificate::revoke(&ctx, &domain),
            Commands::Delete { domain } => commands::certificate::delete(&ctx, &domain),
            Commands::ManageHooks {
                command,
                domain,
                modules,
            } => commands::manage_hooks::run(&ctx, command, domain.as_deref(), &modules),
            Commands::RunPreHooks { domain } => {
                Ok(hooks::run_pre_hooks(&ctx.platform()?, domain.as_deref())?)
            }
            Commands::RunRenewHooks { domain, modules } => Ok(hooks::run_renew_hooks(
                &ctx.platform()?,
                domain.as_deref(),
                &modules,
            )?),
            Commands::RunPostHooks { domain } => {
                Ok(hooks::run_post_hooks(&ctx.platform()?, domain.as_deref())?)
            }
        }
    }
}
