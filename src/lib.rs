//! Live configuration store.
//!
//! Holds a versioned, in-memory configuration that can be replaced at
//! runtime while readers keep observing consistent snapshots.

pub mod codec;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod source;
pub mod store;

pub use config::{AppConfig, Settings};
pub use lifecycle::Shutdown;
pub use reload::{ReloadController, ReloadOutcome, SignalWatcher};
pub use store::{ConfigStore, VersionToken};
