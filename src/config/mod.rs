//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML) + CLI overrides
//!     → loader.rs (parse, apply overrides)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable for the process lifetime)
//!
//! application payload (JSON / YAML / TOML from a source)
//!     → codec (decode + Validate)
//!     → AppConfig (immutable)
//!     → store (versioned, swapped atomically on reload)
//! ```
//!
//! # Design Decisions
//! - Settings are read once; only the application payload is live
//! - All settings fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, SettingsError, SettingsOverrides};
pub use schema::AppConfig;
pub use schema::Settings;
pub use schema::{ConsulSettings, FileSettings, FileVersioning, SourceSettings};
pub use schema::{ReloadSignal, SourceKind, TriggerKind, TriggerSettings};
pub use validation::{Validate, ValidationError};
