//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (dispatch outcomes, latency, connections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `omny_dispatch_total` (counter): dispatches by outcome and status
//! - `omny_dispatch_duration_seconds` (histogram): dispatch latency
//! - `omny_active_connections` (gauge): current connection count
//! - `omny_connections_rejected_total` (counter): connections refused
//! - `omny_static_cache_entries` (gauge): files held by request-and-load mounts
//! - `omny_config_reloads_total` (counter): reload attempts by result
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Without an installed recorder every call is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished dispatch. `status` is `None` when a pre-dispatch
/// handler wrote the response.
pub fn record_dispatch(outcome: &'static str, status: Option<u16>, start: Instant) {
    let status = status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string());
    ::metrics::counter!("omny_dispatch_total", "outcome" => outcome, "status" => status).increment(1);
    ::metrics::histogram!("omny_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    ::metrics::gauge!("omny_active_connections").increment(1.0);
}

pub fn connection_closed() {
    ::metrics::gauge!("omny_active_connections").decrement(1.0);
}

pub fn record_connection_rejected(reason: &'static str) {
    ::metrics::counter!("omny_connections_rejected_total", "reason" => reason).increment(1);
}

pub fn record_static_cache_size(entries: usize) {
    ::metrics::gauge!("omny_static_cache_entries").set(entries as f64);
}

pub fn record_config_reload(result: &'static str) {
    ::metrics::counter!("omny_config_reloads_total", "result" => result).increment(1);
}
