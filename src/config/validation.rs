//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check cross-field consistency (trigger kind vs source kind)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over an already-decoded value
//! - Runs before a value is accepted into the system

use std::fmt;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::{Settings, SourceSettings, TriggerKind};

/// A single semantic problem found in a decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Semantic checks run after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Ok(())
    }
}

/// Join errors for display, e.g. `a: x, b: y`.
pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Validate for Settings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match &self.source {
            SourceSettings::Consul(consul) => {
                if consul.key.trim_matches('/').is_empty() {
                    errors.push(ValidationError::new("source.key", "must not be empty"));
                }
                match Url::parse(&consul.address) {
                    Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                    Ok(url) => errors.push(ValidationError::new(
                        "source.address",
                        format!("unsupported scheme '{}'", url.scheme()),
                    )),
                    Err(e) => errors.push(ValidationError::new(
                        "source.address",
                        format!("invalid URL: {}", e),
                    )),
                }
                if consul.timeout_secs == 0 {
                    errors.push(ValidationError::new("source.timeout_secs", "must be greater than 0"));
                }
            }
            SourceSettings::File(file) => {
                if file.path.as_os_str().is_empty() {
                    errors.push(ValidationError::new("source.path", "must not be empty"));
                } else if file.path.to_str().is_none() {
                    errors.push(ValidationError::new("source.path", "must be valid UTF-8"));
                }
            }
        }

        if self.trigger.interval_secs == 0 {
            errors.push(ValidationError::new("trigger.interval_secs", "must be greater than 0"));
        }
        if self.trigger.kind == TriggerKind::File && !matches!(self.source, SourceSettings::File(_)) {
            errors.push(ValidationError::new(
                "trigger.kind",
                "file trigger requires a file source",
            ));
        }

        if self.observability.metrics_enabled
            && self.observability.metrics_address.parse::<SocketAddr>().is_err()
        {
            errors.push(ValidationError::new(
                "observability.metrics_address",
                format!("invalid socket address '{}'", self.observability.metrics_address),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
