//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Settings → build source + decoder + store → initial load (fatal on error)
//!     → build reload trigger
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → watcher loop exits
//! ```
//!
//! # Design Decisions
//! - Fail fast: the process never starts without a valid configuration
//! - The reload signal (SIGUSR2 by default) is owned by the reload
//!   trigger, not by this module

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{
    bootstrap, build_controller, build_source, build_trigger, initial_load, Runtime, StartupError,
};
