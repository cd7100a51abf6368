//! One fetch → compare → decode → swap cycle.

use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::error::ReloadError;
use crate::codec::ConfigDecoder;
use crate::observability::metrics;
use crate::source::ConfigSource;
use crate::store::{ConfigStore, VersionToken};

/// Result of a reload cycle that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// A newer configuration was decoded and swapped in.
    Applied {
        previous: VersionToken,
        version: VersionToken,
    },
    /// The fetched version was not newer than the stored one.
    Unchanged {
        current: VersionToken,
        fetched: VersionToken,
    },
}

impl ReloadOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, ReloadOutcome::Applied { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            ReloadOutcome::Applied { .. } => "applied",
            ReloadOutcome::Unchanged { .. } => "unchanged",
        }
    }
}

/// Drives reload cycles for a single key against a single store.
///
/// Safe to invoke redundantly and concurrently: the version gate turns
/// duplicate or stale fetches into no-ops.
pub struct ReloadController<T> {
    source: Arc<dyn ConfigSource>,
    decoder: Arc<dyn ConfigDecoder<T>>,
    key: String,
    store: ConfigStore<T>,
}

impl<T> Clone for ReloadController<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            decoder: Arc::clone(&self.decoder),
            key: self.key.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T> ReloadController<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(
        source: Arc<dyn ConfigSource>,
        decoder: Arc<dyn ConfigDecoder<T>>,
        key: impl Into<String>,
        store: ConfigStore<T>,
    ) -> Self {
        Self {
            source,
            decoder,
            key: key.into(),
            store,
        }
    }

    pub fn store(&self) -> &ConfigStore<T> {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Run one reload cycle.
    ///
    /// Source and decode failures are returned, never retried, and leave
    /// the stored configuration authoritative.
    pub async fn reload_once(&self) -> Result<ReloadOutcome, ReloadError> {
        let span = tracing::info_span!(
            "reload",
            cycle = %Uuid::new_v4(),
            source = self.source.name(),
            key = %self.key,
        );
        let started = Instant::now();

        let result = self.run_cycle().instrument(span).await;

        match &result {
            Ok(outcome) => {
                metrics::record_reload(outcome.label(), started.elapsed());
                if let ReloadOutcome::Applied { version, .. } = outcome {
                    metrics::record_config_version(*version);
                }
            }
            Err(e) => {
                metrics::record_reload("failed", started.elapsed());
                metrics::record_reload_error(e.kind().as_str());
            }
        }
        result
    }

    async fn run_cycle(&self) -> Result<ReloadOutcome, ReloadError> {
        tracing::debug!("Loading configuration");
        let raw = self.source.fetch(&self.key).await?;

        let current = self.store.current_version();
        if raw.version <= current {
            tracing::info!(
                current = %current,
                fetched = %raw.version,
                "No configuration updates to load"
            );
            return Ok(ReloadOutcome::Unchanged {
                current,
                fetched: raw.version,
            });
        }

        let config = self.decoder.decode(&raw.bytes).map_err(|e| {
            tracing::warn!(version = %raw.version, error = %e, "Rejected undecodable configuration");
            e
        })?;

        if self.store.swap_if_newer(config, raw.version) {
            tracing::info!(previous = %current, version = %raw.version, "Configuration loaded");
            Ok(ReloadOutcome::Applied {
                previous: current,
                version: raw.version,
            })
        } else {
            // Another cycle stored an equal or newer version after our check.
            let current = self.store.current_version();
            tracing::info!(
                current = %current,
                fetched = %raw.version,
                "Newer configuration already applied"
            );
            Ok(ReloadOutcome::Unchanged {
                current,
                fetched: raw.version,
            })
        }
    }
}
