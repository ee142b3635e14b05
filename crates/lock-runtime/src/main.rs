//! Quantum-Lock service binary.

use anyhow::{Context, Result};
use lock_runtime::{LockRuntime, RuntimeConfig};
use quantum_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging first so configuration warnings are visible
    let telemetry = TelemetryConfig::from_env();
    let _telemetry = init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    let runtime = LockRuntime::start(config)
        .await
        .context("Failed to start lock runtime")?;

    info!("Lock server is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;

    Ok(())
}
