//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick plain or JSON output from settings
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - HTTP client internals are capped at `warn`

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilitySettings;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("{},hyper=warn,hyper_util=warn,reqwest=warn", level)
}

/// Install the global subscriber.
pub fn init_logging(settings: &ObservabilitySettings) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&settings.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json_logs {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    }
}
