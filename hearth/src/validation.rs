//! Argument validation for domain and module names.
//!
//! Both end up as words in hook command lines that the certificate client
//! later executes, so anything outside a narrow character set is rejected
//! before it reaches the renewal config.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid domain name: '{0}'")]
    InvalidDomain(String),

    #[error("Invalid domain name '{0}': {1}")]
    InvalidDomainPattern(String, String),

    #[error("Invalid module name: '{0}'")]
    InvalidModule(String),
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Validate a DNS hostname and return it lower-cased.
pub fn validate_domain(domain: &str) -> ValidationResult<String> {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return Err(ValidationError::InvalidDomain(domain));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidDomainPattern(
            domain,
            "must include a TLD (e.g., 'box.example.org' not 'box')".to_string(),
        ));
    }

    if domain.len() > 253 {
        return Err(ValidationError::InvalidDomainPattern(
            domain,
            "exceeds 253 characters".to_string(),
        ));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(ValidationError::InvalidDomain(domain));
        }

        if !label
            .chars()
            .next()
            .map(|c| c.is_ascii_alphanumeric())
            .unwrap_or(false)
        {
            return Err(ValidationError::InvalidDomain(domain));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::InvalidDomain(domain));
        }

        if label.ends_with('-') {
            return Err(ValidationError::InvalidDomain(domain));
        }

        if label.len() > 63 {
            return Err(ValidationError::InvalidDomainPattern(
                domain,
                "label exceeds 63 character limit".to_string(),
            ));
        }
    }

    Ok(domain)
}

/// Validate a dependent module name (`[a-z0-9_-]+`, not starting with `-`).
pub fn validate_module(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !valid {
        return Err(ValidationError::InvalidModule(name.to_string()));
    }
    Ok(name.to_string())
}

/// clap value parser for `--domain`.
pub fn parse_domain(value: &str) -> Result<String, String> {
    validate_domain(value).map_err(|e| e.to_string())
}

/// clap value parser for `--modules`.
pub fn parse_module(value: &str) -> Result<String, String> {
    validate_module(value).map_err(|e| e.to_string())
}
