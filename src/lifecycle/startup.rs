//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the configured source and decoder
//! - Perform the initial load; any failure is fatal
//! - Build the reload trigger for the watcher
//!
//! # Design Decisions
//! - Fail fast: a missing key, unreachable backend or bad payload at
//!   startup stops the process
//! - The trigger is built after the initial load so a failed start leaves
//!   no signal handlers behind

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{AppConfig, Settings, SourceSettings, TriggerKind};
use crate::reload::{
    FileChangeTrigger, IntervalTrigger, ReloadController, ReloadError, ReloadOutcome, ReloadTrigger,
};
use crate::source::{ConfigSource, ConsulSource, FileSource, SourceError};
use crate::store::{ConfigStore, Snapshot};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create configuration source: {0}")]
    Source(SourceError),

    #[error("initial configuration load failed: {0}")]
    InitialLoad(ReloadError),

    #[error("failed to install reload trigger: {0}")]
    Trigger(String),
}

/// Everything the process needs after a successful start.
pub struct Runtime {
    pub store: ConfigStore<AppConfig>,
    pub controller: ReloadController<AppConfig>,
    pub initial: Arc<Snapshot<AppConfig>>,
}

pub fn build_source(settings: &Settings) -> Result<Arc<dyn ConfigSource>, StartupError> {
    match &settings.source {
        SourceSettings::Consul(consul) => {
            let source = ConsulSource::new(consul).map_err(StartupError::Source)?;
            Ok(Arc::new(source))
        }
        SourceSettings::File(file) => {
            let source = FileSource::new(file.versioning);
            tracing::info!(
                path = %file.path.display(),
                versioning = ?source.versioning(),
                "Using file configuration source"
            );
            Ok(Arc::new(source))
        }
    }
}

/// Controller over a fresh, empty store.
pub fn build_controller(settings: &Settings) -> Result<ReloadController<AppConfig>, StartupError> {
    let source = build_source(settings)?;
    Ok(ReloadController::new(
        source,
        Arc::new(settings.format()),
        settings.source_key(),
        ConfigStore::new(),
    ))
}

/// Run the first reload cycle and return the loaded snapshot.
pub async fn initial_load<T>(
    controller: &ReloadController<T>,
) -> Result<Arc<Snapshot<T>>, StartupError>
where
    T: Send + Sync + 'static,
{
    tracing::info!(
        source = controller.source_name(),
        key = %controller.key(),
        "Loading initial configuration"
    );

    let outcome = controller
        .reload_once()
        .await
        .map_err(StartupError::InitialLoad)?;

    match (outcome, controller.store().get()) {
        (ReloadOutcome::Applied { .. }, Some(snapshot)) => Ok(snapshot),
        (ReloadOutcome::Unchanged { .. }, Some(snapshot)) => {
            tracing::debug!(version = %snapshot.version(), "Store was already populated");
            Ok(snapshot)
        }
        // Only reachable when the source reports the UNSET version.
        (_, None) => Err(StartupError::InitialLoad(ReloadError::Source(
            SourceError::unavailable(
                controller.source_name(),
                "source returned an unset version",
            ),
        ))),
    }
}

/// Build the controller for `settings` and load the initial configuration.
pub async fn bootstrap(settings: &Settings) -> Result<Runtime, StartupError> {
    let controller = build_controller(settings)?;
    let initial = initial_load(&controller).await?;

    Ok(Runtime {
        store: controller.store().clone(),
        controller,
        initial,
    })
}

/// Build the reload trigger selected in `settings`.
///
/// Must be called inside a Tokio runtime.
pub fn build_trigger(settings: &Settings) -> Result<Box<dyn ReloadTrigger>, StartupError> {
    match settings.trigger.kind {
        TriggerKind::Signal => signal_trigger(settings),
        TriggerKind::File => match &settings.source {
            SourceSettings::File(file) => FileChangeTrigger::new(&file.path)
                .map(|trigger| Box::new(trigger) as Box<dyn ReloadTrigger>)
                .map_err(|e| StartupError::Trigger(e.to_string())),
            SourceSettings::Consul(_) => Err(StartupError::Trigger(
                "file trigger requires a file source".to_string(),
            )),
        },
        TriggerKind::Interval => Ok(Box::new(IntervalTrigger::new(Duration::from_secs(
            settings.trigger.interval_secs,
        )))),
    }
}

#[cfg(unix)]
fn signal_trigger(settings: &Settings) -> Result<Box<dyn ReloadTrigger>, StartupError> {
    use crate::reload::SignalTrigger;

    SignalTrigger::new(settings.trigger.signal)
        .map(|trigger| Box::new(trigger) as Box<dyn ReloadTrigger>)
        .map_err(|e| StartupError::Trigger(e.to_string()))
}

#[cfg(not(unix))]
fn signal_trigger(_settings: &Settings) -> Result<Box<dyn ReloadTrigger>, StartupError> {
    Err(StartupError::Trigger(
        "signal triggers are only supported on unix".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileSettings, FileVersioning};
    use crate::reload::ErrorKind;
    use std::fs;

    fn file_settings(path: &std::path::Path) -> Settings {
        Settings {
            source: SourceSettings::File(FileSettings {
                path: path.to_path_buf(),
                versioning: FileVersioning::Content,
                format: None,
            }),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "mode: a\ncacheSize: 10\n").unwrap();

        let runtime = bootstrap(&file_settings(&path)).await.unwrap();
        assert_eq!(runtime.initial.config().mode, "a");
        assert_eq!(runtime.initial.config().cache_size, 10);
        assert!(!runtime.initial.version().is_unset());
        assert_eq!(runtime.store.current_version(), runtime.initial.version());
    }

    #[tokio::test]
    async fn test_bootstrap_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        match bootstrap(&file_settings(&path)).await {
            Err(StartupError::InitialLoad(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("bootstrap must fail without a configuration"),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_fails_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{\"mode\": ").unwrap();

        match bootstrap(&file_settings(&path)).await {
            Err(StartupError::InitialLoad(e)) => assert_eq!(e.kind(), ErrorKind::Decode),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("bootstrap must fail on a malformed payload"),
        }
    }

    #[tokio::test]
    async fn test_build_trigger_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "mode: a\ncacheSize: 1\n").unwrap();

        let mut settings = file_settings(&path);
        settings.trigger.kind = TriggerKind::File;
        let trigger = build_trigger(&settings).unwrap();
        assert!(trigger.describe().contains("config.yaml"));

        settings.trigger.kind = TriggerKind::Interval;
        settings.trigger.interval_secs = 3;
        assert_eq!(build_trigger(&settings).unwrap().describe(), "every 3s");

        let mut consul = Settings::default();
        consul.trigger.kind = TriggerKind::File;
        assert!(matches!(build_trigger(&consul), Err(StartupError::Trigger(_))));
    }
}
