//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Reload cycles produce:
//!     → logging.rs (structured log events, one span per cycle)
//!     → metrics.rs (counters, histogram)
//!
//! Consumers:
//!     → stdout (plain or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every cycle gets a UUID so interleaved log lines can be grouped
//! - Metrics calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
