//! Metrics collection and exposition.
//!
//! # Metrics
//! - `live_config_reloads_total` (counter): reload cycles by outcome
//!   (`applied`, `unchanged`, `failed`)
//! - `live_config_reload_errors_total` (counter): failures by kind
//! - `live_config_version` (counter): version of the applied configuration,
//!   set absolutely so large Consul indexes are reported exactly
//! - `live_config_reload_duration_seconds` (histogram): cycle latency

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

use crate::store::VersionToken;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn describe_metrics() {
    ::metrics::describe_counter!("live_config_reloads_total", "Reload cycles by outcome");
    ::metrics::describe_counter!("live_config_reload_errors_total", "Failed reload cycles by error kind");
    ::metrics::describe_counter!("live_config_version", "Version of the applied configuration");
    ::metrics::describe_histogram!(
        "live_config_reload_duration_seconds",
        ::metrics::Unit::Seconds,
        "Reload cycle latency"
    );
}

pub fn record_reload(outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("live_config_reloads_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("live_config_reload_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_reload_error(kind: &'static str) {
    ::metrics::counter!("live_config_reload_errors_total", "kind" => kind).increment(1);
}

/// Applied versions only move forward, so a counter holds them without the
/// precision loss of an `f64` gauge.
pub fn record_config_version(version: VersionToken) {
    ::metrics::counter!("live_config_version").absolute(version.get());
}
