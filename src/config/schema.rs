//! Configuration schema definitions.
//!
//! Two kinds of configuration live here:
//! - [`AppConfig`]: the live payload served by the store and replaced on reload.
//! - [`Settings`]: the daemon's own settings, read once at startup from TOML.
//!
//! All settings types derive Serde traits and default every field so a
//! minimal (or absent) settings file works.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::codec::Format;
use crate::config::validation::{Validate, ValidationError};

/// Application configuration delivered by the configured source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Operating mode, e.g. "a" or "b".
    pub mode: String,

    /// Cache size in entries.
    #[serde(rename = "cacheSize", alias = "cache_size")]
    pub cache_size: u64,
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        if self.mode.trim().is_empty() {
            return Err(vec![ValidationError::new("mode", "must not be empty")]);
        }
        Ok(())
    }
}

/// Root settings for the live-config daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Where the application configuration is fetched from.
    pub source: SourceSettings,

    /// What triggers a reload.
    pub trigger: TriggerSettings,

    /// Logging and metrics.
    pub observability: ObservabilitySettings,
}

impl Settings {
    /// The key (Consul) or path (file) handed to the source on every fetch.
    ///
    /// Validation rejects non-UTF-8 file paths, so the path round-trips
    /// exactly for validated settings.
    pub fn source_key(&self) -> String {
        match &self.source {
            SourceSettings::Consul(consul) => consul.key.clone(),
            SourceSettings::File(file) => file.path.to_string_lossy().into_owned(),
        }
    }

    /// Payload format, explicit or derived from the source kind.
    pub fn format(&self) -> Format {
        match &self.source {
            SourceSettings::Consul(consul) => consul.format.unwrap_or(Format::Json),
            SourceSettings::File(file) => file.format.unwrap_or_else(|| Format::from_path(&file.path)),
        }
    }
}

/// Configuration source selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSettings {
    Consul(ConsulSettings),
    File(FileSettings),
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings::Consul(ConsulSettings::default())
    }
}

impl SourceSettings {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceSettings::Consul(_) => SourceKind::Consul,
            SourceSettings::File(_) => SourceKind::File,
        }
    }
}

/// Source kind, as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Consul,
    File,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consul" => Ok(SourceKind::Consul),
            "file" => Ok(SourceKind::File),
            other => Err(format!("unknown source kind '{}' (expected consul or file)", other)),
        }
    }
}

/// Consul KV backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsulSettings {
    /// Agent HTTP address (e.g., "http://127.0.0.1:8500").
    pub address: String,

    /// KV key holding the configuration document.
    pub key: String,

    /// ACL token sent as `X-Consul-Token`.
    pub token: Option<String>,

    /// Datacenter to query instead of the agent's own.
    pub datacenter: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Payload format (default: JSON).
    pub format: Option<Format>,
}

impl Default for ConsulSettings {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8500".to_string(),
            key: "samples/app".to_string(),
            token: None,
            datacenter: None,
            timeout_secs: 5,
            format: None,
        }
    }
}

/// Local file backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileSettings {
    /// Path to the configuration document.
    pub path: PathBuf,

    /// How version tokens are derived from the file.
    pub versioning: FileVersioning,

    /// Payload format (default: inferred from the extension).
    pub format: Option<Format>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./config.yaml"),
            versioning: FileVersioning::default(),
            format: None,
        }
    }
}

/// Version token strategy for file-backed sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileVersioning {
    /// Advance the token only when the file content changes.
    #[default]
    Content,
    /// Advance the token on every read, so every reload applies.
    Always,
}

/// Reload trigger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TriggerSettings {
    pub kind: TriggerKind,

    /// Signal listened for when `kind = "signal"`.
    pub signal: ReloadSignal,

    /// Period in seconds when `kind = "interval"`.
    pub interval_secs: u64,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            kind: TriggerKind::Signal,
            signal: ReloadSignal::Usr2,
            interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// A unix signal.
    Signal,
    /// A change event on the source file.
    File,
    /// A fixed timer.
    Interval,
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "signal" => Ok(TriggerKind::Signal),
            "file" => Ok(TriggerKind::File),
            "interval" => Ok(TriggerKind::Interval),
            other => Err(format!(
                "unknown trigger kind '{}' (expected signal, file or interval)",
                other
            )),
        }
    }
}

/// Signals accepted as a reload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadSignal {
    Hup,
    Usr1,
    Usr2,
}

impl FromStr for ReloadSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase();
        match name.trim_start_matches("sig") {
            "hup" => Ok(ReloadSignal::Hup),
            "usr1" => Ok(ReloadSignal::Usr1),
            "usr2" => Ok(ReloadSignal::Usr2),
            _ => Err(format!("unknown reload signal '{}' (expected hup, usr1 or usr2)", s)),
        }
    }
}

impl fmt::Display for ReloadSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReloadSignal::Hup => "SIGHUP",
            ReloadSignal::Usr1 => "SIGUSR1",
            ReloadSignal::Usr2 => "SIGUSR2",
        };
        f.write_str(name)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
