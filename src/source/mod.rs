//! Configuration sources.
//!
//! # Responsibilities
//! - Fetch raw configuration bytes for a key (Consul) or path (file)
//! - Attach a monotonically comparable version token to every fetch
//! - Classify failures as "backend unavailable" or "not found"
//!
//! # Design Decisions
//! - Sources never decode; bytes go to the codec untouched
//! - No retries here: one fetch per reload attempt
//! - Version semantics are backend-defined (Consul ModifyIndex, file generation)

pub mod consul;
pub mod file;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::VersionToken;

pub use consul::ConsulSource;
pub use file::FileSource;

/// Raw bytes plus the backend's version for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConfig {
    pub bytes: Vec<u8>,
    pub version: VersionToken,
}

impl RawConfig {
    pub fn new(bytes: impl Into<Vec<u8>>, version: impl Into<VersionToken>) -> Self {
        Self {
            bytes: bytes.into(),
            version: version.into(),
        }
    }
}

/// Failure to fetch from a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The backend could not be reached or answered unusably.
    #[error("{source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    /// The key or path does not exist.
    #[error("configuration not found at '{key}'")]
    NotFound { key: String },
}

impl SourceError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        SourceError::Unavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        SourceError::NotFound { key: key.into() }
    }
}

/// A backend that configuration can be fetched from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetch the current bytes and version stored under `key`.
    async fn fetch(&self, key: &str) -> Result<RawConfig, SourceError>;

    /// Short backend name for logs and metrics.
    fn name(&self) -> &str;
}
