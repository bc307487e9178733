//! Observability infrastructure for the connector
//!
//! Provides:
//! - Prometheus metrics (API latency, received hooks, synchronization runs)
//! - Structured logging of connector lifecycle events

use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for AM-Vision round trips (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ConnectorMetricsInner> = OnceLock::new();

struct ConnectorMetricsInner {
    api_request_duration_seconds: HistogramVec,
    hooks_received: IntCounterVec,
    sync_runs: IntCounterVec,
}

impl ConnectorMetricsInner {
    fn new() -> Self {
        Self {
            api_request_duration_seconds: register_histogram_vec!(
                "amv_api_request_duration_seconds",
                "Round trip time of requests to the AM-Vision API",
                &["method", "status"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register api_request_duration_seconds"),

            hooks_received: register_int_counter_vec!(
                "amv_hooks_received_total",
                "Webhook deliveries received, by event and outcome",
                &["event", "outcome"]
            )
            .expect("Failed to register hooks_received"),

            sync_runs: register_int_counter_vec!(
                "amv_sync_runs_total",
                "Synchronization runs, by outcome",
                &["outcome"]
            )
            .expect("Failed to register sync_runs"),
        }
    }
}

/// Connector metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct ConnectorMetrics {
    _private: (),
}

impl Default for ConnectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ConnectorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ConnectorMetricsInner {
        GLOBAL_METRICS.get_or_init(ConnectorMetricsInner::new)
    }

    /// Record the latency of one AM-Vision request
    pub fn observe_api_request(&self, method: &str, status: u16, duration_secs: f64) {
        self.inner()
            .api_request_duration_seconds
            .with_label_values(&[method, &status.to_string()])
            .observe(duration_secs);
    }

    /// Count a received hook; outcome is one of `handled`, `invalid`, `unknown`, `failed`
    pub fn inc_hook(&self, event: &str, outcome: &str) {
        self.inner()
            .hooks_received
            .with_label_values(&[event, outcome])
            .inc();
    }

    pub fn inc_sync_run(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.inner().sync_runs.with_label_values(&[outcome]).inc();
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn render(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        buffer
    }
}

/// Structured logger for connector lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    connector: String,
}

impl StructuredLogger {
    pub fn new(connector: impl Into<String>) -> Self {
        Self {
            connector: connector.into(),
        }
    }

    /// Log connector startup
    pub fn log_startup(&self, version: &str, amv_url: &str, single_sync: bool) {
        info!(
            event = "connector_started",
            connector = %self.connector,
            version = %version,
            amv_url = %amv_url,
            single_sync = single_sync,
            "AM-Vision connector started"
        );
    }

    /// Log connector shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "connector_shutdown",
            connector = %self.connector,
            reason = %reason,
            "AM-Vision connector shutting down"
        );
    }

    /// Log the outcome of one synchronization run
    pub fn log_sync(&self, duration_ms: u128, error: Option<&anyhow::Error>) {
        match error {
            None => info!(
                event = "sync_completed",
                connector = %self.connector,
                duration_ms = duration_ms as u64,
                "Synchronization completed"
            ),
            Some(e) => warn!(
                event = "sync_failed",
                connector = %self.connector,
                duration_ms = duration_ms as u64,
                error = %format!("{:#}", e),
                "Synchronization failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_metrics_render() {
        let metrics = ConnectorMetrics::new();

        metrics.observe_api_request("PUT", 200, 0.02);
        metrics.inc_hook("batch.started", "handled");
        metrics.inc_sync_run(true);

        let text = String::from_utf8(metrics.render()).unwrap();
        assert!(text.contains("amv_api_request_duration_seconds_bucket"));
        assert!(text.contains("amv_hooks_received_total"));
        assert!(text.contains("amv_sync_runs_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("demo");
        assert_eq!(logger.connector, "demo");
    }
}
