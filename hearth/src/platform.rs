//! Per-invocation view of the box: fresh configuration plus the tools
//! that act on it.

use std::path::{Path, PathBuf};

use hearth_core::CommandRunner;

use crate::actions::ModuleActions;
use crate::certbot::Certbot;
use crate::config::{self, HearthToml};
use crate::services::Systemd;
use crate::webserver::Apache;

/// What every command handler starts from: where the config lives and how
/// to spawn tools. The config itself is read by [`Context::platform`] each
/// time a handler asks for it.
pub struct Context<'a> {
    config_path: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> Context<'a> {
    pub fn new(config_path: PathBuf, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config_path,
            runner,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Read the configuration from disk and bind it to the runner.
    pub fn platform(&self) -> config::Result<Platform<'a>> {
        let config = HearthToml::load(&self.config_path)?;
        Ok(Platform::new(config, self.runner))
    }
}

pub struct Platform<'a> {
    pub config: HearthToml,
    runner: &'a dyn CommandRunner,
}

impl<'a> Platform<'a> {
    pub fn new(config: HearthToml, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    pub fn certbot(&self) -> Certbot<'_> {
        Certbot::new(self.runner, &self.config.programs, &self.config.paths)
    }

    pub fn web(&self) -> Apache<'_> {
        Apache::new(self.runner, &self.config.programs, &self.config.paths)
    }

    pub fn services(&self) -> Systemd<'_> {
        Systemd::new(self.runner, &self.config.programs.systemctl)
    }

    pub fn actions(&self) -> ModuleActions<'_> {
        ModuleActions::new(self.runner, &self.config.paths.actions_dir)
    }

    /// Reload the web server if it is running, so site changes take effect.
    pub fn reload_web_server(&self) -> Result<(), hearth_core::ProcessError> {
        let service = &self.config.programs.web_service;
        let services = self.services();
        if services.is_running(service) {
            services.reload(service)?;
        } else {
            tracing::info!(service = %service, "web server not running, skipping reload");
        }
        Ok(())
    }
}
