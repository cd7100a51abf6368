//! Reload subsystem.
//!
//! # Data Flow
//! ```text
//! ReloadTrigger (signal / file change / interval)
//!     → SignalWatcher (one cycle per event, on its own task)
//!     → ReloadController::reload_once
//!         → ConfigSource::fetch(key)      SourceUnavailable / NotFound
//!         → version gate                  fetched <= current → Unchanged
//!         → ConfigDecoder::decode         DecodeError, store untouched
//!         → ConfigStore::swap_if_newer    Applied
//! ```
//!
//! # Design Decisions
//! - "No newer version" is success, so duplicate triggers are free
//! - No retries inside a cycle; each event is one attempt
//! - Errors after startup are logged, never fatal

pub mod controller;
pub mod error;
pub mod trigger;
pub mod watcher;

pub use controller::{ReloadController, ReloadOutcome};
pub use error::{ErrorKind, ReloadError};
#[cfg(unix)]
pub use trigger::SignalTrigger;
pub use trigger::{FileChangeTrigger, IntervalTrigger, ReloadEvent, ReloadTrigger};
pub use watcher::{SignalWatcher, WatchState, WatchSummary};
