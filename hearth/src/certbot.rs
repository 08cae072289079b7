//! Certificate client (certbot) and end-date query (openssl).

use hearth_core::{CommandRunner, ProcessError, Validity};

use crate::config::{PathsConfig, ProgramsConfig};

pub struct Certbot<'a> {
    runner: &'a dyn CommandRunner,
    programs: &'a ProgramsConfig,
    paths: &'a PathsConfig,
}

impl<'a> Certbot<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        programs: &'a ProgramsConfig,
        paths: &'a PathsConfig,
    ) -> Self {
        Self {
            runner,
            programs,
            paths,
        }
    }

    /// Issue (or force-renew) a certificate through the webroot authenticator.
    pub fn obtain(&self, domain: &str) -> Result<(), ProcessError> {
        let args = vec![
            "certonly".to_string(),
            "--non-interactive".to_string(),
            "--agree-tos".to_string(),
            "--register-unsafely-without-email".to_string(),
            "--domain".to_string(),
            domain.to_string(),
            "--authenticator".to_string(),
            "webroot".to_string(),
            "--webroot-path".to_string(),
            self.paths.webroot.to_string_lossy().to_string(),
            "--renew-by-default".to_string(),
        ];
        self.certbot(&args)
    }

    /// Revoke the certificate and remove it from the store.
    pub fn revoke(&self, domain: &str) -> Result<(), ProcessError> {
        let cert_path = self.paths.certificate_file(domain, "cert.pem");
        let args = vec![
            "revoke".to_string(),
            "--non-interactive".to_string(),
            "--domain".to_string(),
            domain.to_string(),
            "--cert-path".to_string(),
            cert_path.to_string_lossy().to_string(),
            "--delete-after-revoke".to_string(),
        ];
        self.certbot(&args)
    }

    pub fn delete(&self, domain: &str) -> Result<(), ProcessError> {
        let args = vec![
            "delete".to_string(),
            "--non-interactive".to_string(),
            "--cert-name".to_string(),
            domain.to_string(),
        ];
        self.certbot(&args)
    }

    /// Ask the client how it classifies the certificate for `domain`.
    pub fn validity(&self, domain: &str) -> Result<Validity, ProcessError> {
        let args = vec![
            "certificates".to_string(),
            "--domain".to_string(),
            domain.to_string(),
        ];
        let output = self
            .runner
            .run(&self.programs.certbot, &args)?
            .into_success()?;
        Ok(parse_validity(&output.stdout))
    }

    /// End date of the live certificate, e.g. `Jun 11 12:00:00 2030 GMT`.
    pub fn expiry_date(&self, domain: &str) -> Result<Option<String>, ProcessError> {
        let cert_path = self.paths.certificate_file(domain, "cert.pem");
        let args = vec![
            "x509".to_string(),
            "-enddate".to_string(),
            "-noout".to_string(),
            "-in".to_string(),
            cert_path.to_string_lossy().to_string(),
        ];
        let output = self
            .runner
            .run(&self.programs.openssl, &args)?
            .into_success()?;
        Ok(parse_enddate(&output.stdout))
    }

    fn certbot(&self, args: &[String]) -> Result<(), ProcessError> {
        self.runner
            .run(&self.programs.certbot, args)?
            .into_success()
            .map(|_| ())
    }
}

/// Classify `certbot certificates` output.
///
/// `INVALID: <reason>` wins over `VALID`, since the former contains the latter.
pub fn parse_validity(output: &str) -> Validity {
    if let Some(idx) = output.find("INVALID: ") {
        let rest = &output[idx + "INVALID: ".len()..];
        let end = rest
            .find(|c: char| c == ')' || c == '\n' || c == ',')
            .unwrap_or(rest.len());
        return Validity::from_reason(&rest[..end]);
    }
    if output.contains("VALID") {
        return Validity::Valid;
    }
    Validity::Unknown
}

fn parse_enddate(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.trim_start().starts_with("notAfter="))?;
    let value = line.trim().trim_start_matches("notAfter=").trim();
    (!value.is_empty()).then(|| value.to_string())
}
