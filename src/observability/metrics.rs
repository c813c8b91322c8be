//! Lifecycle metrics.
//!
//! # Metrics
//! - `graceful_component_start_failures_total` (counter): start failures by component
//! - `graceful_component_stop_failures_total` (counter): stop failures by component
//! - `graceful_shutdown_timeouts_total` (counter): shutdown phases that hit their deadline
//! - `graceful_shutdown_duration_seconds` (histogram): shutdown phase latency by outcome

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_start_failure(component: &str) {
    metrics::counter!(
        "graceful_component_start_failures_total",
        "component" => component.to_string()
    )
    .increment(1);
}

pub fn record_stop_failure(component: &str) {
    metrics::counter!(
        "graceful_component_stop_failures_total",
        "component" => component.to_string()
    )
    .increment(1);
}

pub fn record_shutdown_timeout() {
    metrics::counter!("graceful_shutdown_timeouts_total").increment(1);
}

pub fn record_shutdown(elapsed: Duration, outcome: &'static str) {
    metrics::histogram!("graceful_shutdown_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}
