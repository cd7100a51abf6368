//! Settings loading from disk and command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::Format;
use crate::config::schema::{
    ConsulSettings, FileSettings, ReloadSignal, Settings, SourceKind, SourceSettings, TriggerKind,
};
use crate::config::validation::{join_errors, Validate, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings, SettingsError> {
    let settings: Settings = toml::from_str(content)?;
    settings.validate().map_err(SettingsError::Validation)?;
    Ok(settings)
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub source: Option<SourceKind>,
    pub key: Option<String>,
    pub path: Option<PathBuf>,
    pub address: Option<String>,
    pub format: Option<Format>,
    pub trigger: Option<TriggerKind>,
    pub signal: Option<ReloadSignal>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl SettingsOverrides {
    /// Apply the overrides and re-validate the result.
    pub fn apply(&self, mut settings: Settings) -> Result<Settings, SettingsError> {
        if let Some(kind) = self.source {
            if settings.source.kind() != kind {
                settings.source = match kind {
                    SourceKind::Consul => SourceSettings::Consul(ConsulSettings::default()),
                    SourceKind::File => SourceSettings::File(FileSettings::default()),
                };
            }
        }

        let mut errors = Vec::new();
        match &mut settings.source {
            SourceSettings::Consul(consul) => {
                if self.path.is_some() {
                    errors.push(ValidationError::new("path", "only applies to a file source"));
                }
                if let Some(key) = &self.key {
                    consul.key = key.clone();
                }
                if let Some(address) = &self.address {
                    consul.address = address.clone();
                }
                if self.format.is_some() {
                    consul.format = self.format;
                }
            }
            SourceSettings::File(file) => {
                if self.key.is_some() {
                    errors.push(ValidationError::new("key", "only applies to a consul source"));
                }
                if self.address.is_some() {
                    errors.push(ValidationError::new("address", "only applies to a consul source"));
                }
                if let Some(path) = &self.path {
                    file.path = path.clone();
                }
                if self.format.is_some() {
                    file.format = self.format;
                }
            }
        }

        if let Some(kind) = self.trigger {
            settings.trigger.kind = kind;
        }
        if let Some(signal) = self.signal {
            settings.trigger.signal = signal;
        }
        if let Some(level) = &self.log_level {
            settings.observability.log_level = level.clone();
        }
        if self.json_logs {
            settings.observability.json_logs = true;
        }

        if let Err(mut invalid) = settings.validate() {
            errors.append(&mut invalid);
        }
        if !errors.is_empty() {
            return Err(SettingsError::Validation(errors));
        }
        Ok(settings)
    }
}
