//! Metrics collection and exposition.
//!
//! # Metrics
//! - `custody_transfers_submitted_total` (counter): broadcast transfers by kind
//! - `custody_transfers_failed_total` (counter): failed transfers by kind, error
//! - `custody_poll_attempts_total` (counter): status queries by observation
//! - `custody_poll_outcomes_total` (counter): finished polls by outcome
//! - `custody_active_polls` (gauge): status checks currently running
//! - `custody_node_health` (gauge): 1=reachable, 0=unreachable

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must run inside a Tokio runtime. Failure is logged, not fatal.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transfer_submitted(kind: &'static str) {
    metrics::counter!("custody_transfers_submitted_total", "kind" => kind).increment(1);
}

pub fn record_transfer_failed(kind: &'static str, error: &'static str) {
    metrics::counter!(
        "custody_transfers_failed_total",
        "kind" => kind,
        "error" => error
    )
    .increment(1);
}

pub fn record_poll_attempt(observation: &'static str) {
    metrics::counter!("custody_poll_attempts_total", "observation" => observation).increment(1);
}

pub fn record_poll_outcome(outcome: &'static str) {
    metrics::counter!("custody_poll_outcomes_total", "outcome" => outcome).increment(1);
}

pub fn record_active_polls(count: usize) {
    metrics::gauge!("custody_active_polls").set(count as f64);
}

pub fn record_node_health(healthy: bool) {
    metrics::gauge!("custody_node_health").set(if healthy { 1.0 } else { 0.0 });
}
