//! live-config daemon
//!
//! Loads the application configuration once at startup, then reloads it
//! whenever the configured trigger fires.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   event    ┌───────────────┐  fetch   ┌──────────────┐
//!   │ReloadTrigger │──────────▶│ SignalWatcher │────────▶│ ConfigSource │  Consul KV
//!   │signal / file │           │  (own task)   │         │ consul / file│  or local file
//!   │  / interval  │           └───────┬───────┘         └──────────────┘
//!   └──────────────┘                   │ reload_once
//!                                      ▼
//!                           ┌────────────────────┐ decode ┌─────────┐
//!                           │  ReloadController  │───────▶│  codec  │
//!                           │ version gate, swap │        └─────────┘
//!                           └─────────┬──────────┘
//!                                     ▼
//!                           ┌────────────────────┐
//!     readers ◀─────────────│    ConfigStore     │
//!                           │ Arc<Snapshot<T>>   │
//!                           └────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use live_config::codec::Format;
use live_config::config::{
    load_settings, ReloadSignal, Settings, SettingsOverrides, SourceKind, TriggerKind,
};
use live_config::lifecycle::{bootstrap, build_trigger, shutdown_signal, Shutdown};
use live_config::observability::{logging, metrics};
use live_config::{AppConfig, ConfigStore, SignalWatcher};

/// Serve a hot-reloadable configuration from Consul or a local file
#[derive(Parser, Debug)]
#[command(name = "live-config")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Configuration source: consul or file
    #[arg(long)]
    source: Option<SourceKind>,

    /// Consul key holding the configuration
    #[arg(short, long)]
    key: Option<String>,

    /// Configuration file path (file source)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Consul agent address (e.g., http://127.0.0.1:8500)
    #[arg(long)]
    consul_address: Option<String>,

    /// Payload format: json, yaml or toml
    #[arg(long)]
    format: Option<Format>,

    /// Reload trigger: signal, file or interval
    #[arg(long)]
    trigger: Option<TriggerKind>,

    /// Reload signal: usr2, usr1 or hup
    #[arg(long)]
    signal: Option<ReloadSignal>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            source: self.source,
            key: self.key.clone(),
            path: self.path.clone(),
            address: self.consul_address.clone(),
            format: self.format,
            trigger: self.trigger,
            signal: self.signal,
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let base = match &args.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let settings = args.overrides().apply(base)?;

    logging::init_logging(&settings.observability)?;
    tracing::info!("live-config v{} starting", env!("CARGO_PKG_VERSION"));

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let runtime = bootstrap(&settings).await.map_err(|e| {
        tracing::error!(error = %e, "Load config failed");
        e
    })?;
    log_config(&runtime.store);

    let trigger = build_trigger(&settings)?;
    let shutdown = Shutdown::new();
    let watcher = SignalWatcher::new(runtime.controller.clone(), trigger).spawn(shutdown.subscribe());

    let mut changes = runtime.store.subscribe();
    let shutdown_requested = shutdown_signal();
    tokio::pin!(shutdown_requested);

    loop {
        tokio::select! {
            changed = changes.changed() => match changed {
                Ok(_) => log_config(&runtime.store),
                Err(_) => break,
            },
            result = &mut shutdown_requested => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for shutdown signals");
                }
                break;
            }
        }
    }

    shutdown.trigger();
    match watcher.await {
        Ok(summary) => tracing::info!(
            reloads = summary.events,
            applied = summary.applied,
            "Shutdown complete"
        ),
        Err(e) => tracing::error!(error = %e, "Reload watcher task failed"),
    }
    Ok(())
}

fn log_config(store: &ConfigStore<AppConfig>) {
    if let Some(snapshot) = store.get() {
        tracing::info!(
            version = %snapshot.version(),
            mode = %snapshot.config().mode,
            cache_size = snapshot.config().cache_size,
            "Current configuration"
        );
    }
}
