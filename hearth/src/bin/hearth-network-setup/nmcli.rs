use hearth_core::{CommandRunner, ProcessError};

use crate::plan::{Connection, Device, parse_devices};

/// NetworkManager through its command-line client.
pub struct Nmcli<'a> {
    runner: &'a dyn CommandRunner,
    program: &'a str,
}

impl<'a> Nmcli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: &'a str) -> Self {
        Self { runner, program }
    }

    pub fn devices(&self) -> Result<Vec<Device>, ProcessError> {
        let args = ["--terse", "--fields", "DEVICE,TYPE", "device"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let output = self.runner.run(self.program, &args)?.into_success()?;
        Ok(parse_devices(&output.stdout))
    }

    pub fn add(&self, connection: &Connection, passphrase: Option<&str>) -> Result<(), ProcessError> {
        tracing::info!(connection = %connection, "creating connection");
        self.runner
            .run(self.program, &connection.nmcli_args(passphrase))?
            .into_success()
            .map(|_| ())
    }
}
