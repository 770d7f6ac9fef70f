//! Metrics module for subscription-service.
//! Exposes Prometheus metrics for HTTP traffic, store latency and subscription operations.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Store query duration histogram, labelled by `operation`.
pub const DB_QUERY_DURATION: &str = "subscription_db_query_duration_seconds";

/// Subscription operations counter, labelled by `operation`.
pub const SUBSCRIPTION_OPERATIONS_TOTAL: &str = "subscription_operations_total";

/// Initialize the Prometheus recorder. Safe to call more than once.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("A global metrics recorder is already installed");
        }
        handle
    });
}

/// Render all metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Times a single store query; the duration is recorded on drop.
pub struct QueryTimer {
    operation: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        histogram!(DB_QUERY_DURATION, "operation" => self.operation)
            .record(self.start.elapsed().as_secs_f64());
    }
}

/// Record a completed subscription operation.
pub fn record_subscription_operation(operation: &'static str) {
    counter!(SUBSCRIPTION_OPERATIONS_TOTAL, "operation" => operation).increment(1);
}
