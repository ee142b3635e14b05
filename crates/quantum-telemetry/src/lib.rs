//! # Quantum Telemetry
//!
//! Logging and metrics for the Quantum-Lock service.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus collectors updated by the engine and the server
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QL_SERVICE_NAME` | `quantum-lock` | Service name in startup logs |
//! | `QL_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` takes precedence) |
//! | `QL_JSON_LOGS` | `false` | Emit JSON lines |
//! | `QL_METRICS` | `true` | Register Prometheus collectors |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::{parse_flag, TelemetryConfig};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, COMMANDS_PROCESSED, DEADLOCKS_DETECTED,
    LOCKS_ACTIVE, LOCK_REQUESTS, LOCK_WAITERS, LOCK_WAIT_DURATION, SESSIONS_CONNECTED,
};
pub use tracing_setup::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, if enabled, metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    tracing_setup::init_logging(config)?;

    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: Option<MetricsHandle>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::Config("bad filter".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad filter");
    }
}
