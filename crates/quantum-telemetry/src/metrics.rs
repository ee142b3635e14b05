//! Prometheus metrics for the lock service.
//!
//! All metrics follow the naming convention: `ql_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., deadlocks_total)
//! - **Gauge**: Value that can go up or down (e.g., locks_active)
//! - **Histogram**: Distribution of values (e.g., lock_wait_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ENGINE METRICS (ql-01)
    // =========================================================================

    /// Locks currently alive (owned or with waiters)
    pub static ref LOCKS_ACTIVE: Gauge = Gauge::new(
        "ql_engine_locks_active",
        "Number of live locks"
    ).expect("metric creation failed");

    /// Requests currently queued
    pub static ref LOCK_WAITERS: Gauge = Gauge::new(
        "ql_engine_lock_waiters",
        "Number of queued lock requests"
    ).expect("metric creation failed");

    /// Lock requests by kind and outcome
    pub static ref LOCK_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("ql_engine_lock_requests_total", "Lock requests by kind and outcome"),
        // outcome: granted/queued/conflict/timeout/deadlock/cancelled/rejected
        &["kind", "outcome"]
    ).expect("metric creation failed");

    /// Deadlocks detected
    pub static ref DEADLOCKS_DETECTED: Counter = Counter::new(
        "ql_engine_deadlocks_total",
        "Total number of requests refused because of a wait-for cycle"
    ).expect("metric creation failed");

    /// Time spent queued before a grant or timeout
    pub static ref LOCK_WAIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ql_engine_lock_wait_duration_seconds",
            "Time a queued request waited before resolution"
        ).buckets(exponential_buckets(0.001, 2.0, 18).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // SERVER METRICS (ql-02)
    // =========================================================================

    /// Connected client sessions
    pub static ref SESSIONS_CONNECTED: Gauge = Gauge::new(
        "ql_server_sessions_connected",
        "Number of currently connected sessions"
    ).expect("metric creation failed");

    /// Commands processed by name
    pub static ref COMMANDS_PROCESSED: CounterVec = CounterVec::new(
        Opts::new("ql_server_commands_total", "Protocol commands processed"),
        &["command"]
    ).expect("metric creation failed");
}

/// Handle proving the metrics were registered.
pub struct MetricsHandle {
    registered: usize,
}

impl MetricsHandle {
    /// Number of collectors registered.
    pub fn registered(&self) -> usize {
        self.registered
    }
}

/// Register all metrics with the global registry.
///
/// Registering twice fails with `MetricsInit`.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Engine
        Box::new(LOCKS_ACTIVE.clone()),
        Box::new(LOCK_WAITERS.clone()),
        Box::new(LOCK_REQUESTS.clone()),
        Box::new(DEADLOCKS_DETECTED.clone()),
        Box::new(LOCK_WAIT_DURATION.clone()),
        // Server
        Box::new(SESSIONS_CONNECTED.clone()),
        Box::new(COMMANDS_PROCESSED.clone()),
    ];

    let registered = metrics.len();
    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle { registered })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_encode() {
        // May fail if another test already registered, which is fine
        let _ = register_metrics();
        LOCK_REQUESTS.with_label_values(&["exclusive", "granted"]).inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("ql_engine_lock_requests_total"));
    }

    #[test]
    fn test_counter_increment() {
        DEADLOCKS_DETECTED.inc();
        assert!(DEADLOCKS_DETECTED.get() >= 1.0);
    }

    #[test]
    fn test_histogram_observe() {
        let before = LOCK_WAIT_DURATION.get_sample_count();
        LOCK_WAIT_DURATION.observe(0.25);
        assert!(LOCK_WAIT_DURATION.get_sample_count() > before);
    }
}
