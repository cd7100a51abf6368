//! Versioned in-memory configuration store.
//!
//! # Data Flow
//! ```text
//! ReloadController (one writer at a time, possibly racing)
//!     → swap_if_newer(config, version)
//!     → ArcSwapOption<Snapshot<T>> replaced in one pointer store
//!     → watch channel notified with the applied version
//!
//! Readers (any number, any thread)
//!     → get() → Arc<Snapshot<T>> (config and version travel together)
//! ```
//!
//! # Design Decisions
//! - The pair lives behind a single `Arc`, so a reader sees either the old
//!   snapshot or the new one, never a mix
//! - Loads are lock-free; a reader holding a snapshot never delays a swap
//! - Version gating uses compare-and-swap, not a writer lock

mod config_store;
mod version;

pub use config_store::{ConfigStore, Snapshot, StoreClosed, StoreSubscription};
pub use version::VersionToken;
