//! Prometheus metrics for mockline.
//!
//! Tracks served calls, upstream fallbacks, injected delays and background
//! task health.
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};

lazy_static! {
    /// Calls answered by the mock endpoints
    pub static ref CALLS_TOTAL: CounterVec = register_counter_vec!(
        "mockline_calls_total",
        "Total number of mock calls served",
        &["method", "status"]
    )
    .unwrap();

    /// Calls forwarded to an actual endpoint
    pub static ref UPSTREAM_CALLS_TOTAL: CounterVec = register_counter_vec!(
        "mockline_upstream_calls_total",
        "Total number of calls forwarded to the actual endpoint",
        &["result"]  // result: success|failure|skipped
    )
    .unwrap();

    pub static ref INJECTED_DELAY_MS: Histogram = register_histogram!(
        "mockline_injected_delay_ms",
        "Histogram of injected response delay in milliseconds",
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap();

    pub static ref CACHE_REBUILDS_TOTAL: Counter = register_counter!(
        "mockline_cache_rebuilds_total",
        "Total number of endpoint cache rebuilds"
    )
    .unwrap();

    /// Failed or panicked background persistence tasks
    pub static ref BACKGROUND_TASK_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "mockline_background_task_failures_total",
        "Total number of failed background tasks",
        &["task"]  // task: persist_trace|record_call
    )
    .unwrap();
}

/// Collect all metrics in Prometheus text format.
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
