use hearth_core::{CommandRunner, ProcessError};

/// systemd service control through `systemctl`.
pub struct Systemd<'a> {
    runner: &'a dyn CommandRunner,
    systemctl: &'a str,
}

impl<'a> Systemd<'a> {
    pub fn new(runner: &'a dyn CommandRunner, systemctl: &'a str) -> Self {
        Self { runner, systemctl }
    }

    pub fn is_running(&self, service: &str) -> bool {
        let args = vec![
            "is-active".to_string(),
            "--quiet".to_string(),
            service.to_string(),
        ];
        match self.runner.run(self.systemctl, &args) {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::warn!(service, error = %e, "could not query service state");
                false
            }
        }
    }

    pub fn restart(&self, service: &str) -> Result<(), ProcessError> {
        self.control("restart", service)
    }

    pub fn reload(&self, service: &str) -> Result<(), ProcessError> {
        self.control("reload", service)
    }

    fn control(&self, verb: &str, service: &str) -> Result<(), ProcessError> {
        tracing::info!(service, verb, "service control");
        let args = vec![verb.to_string(), service.to_string()];
        self.runner
            .run(self.systemctl, &args)?
            .into_success()
            .map(|_| ())
    }
}
