//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bootstrap_step_total` (counter): bootstrap steps by step, outcome
//! - `export_attempts_total` (counter): HTTP export attempts by outcome
//! - `cpu_usage_average` (gauge): host CPU usage (percent) since start

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_bootstrap_step(step: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("bootstrap_step_total", "step" => step, "outcome" => outcome).increment(1);
}

pub fn record_export_attempt(outcome: &'static str) {
    counter!("export_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_cpu_usage(percent: f64) {
    gauge!("cpu_usage_average").set(percent);
}
