//! # Quantum-Lock Runtime
//!
//! Wires the lock engine (`ql-01`) to the line protocol server (`ql-02`).
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then environment overrides)
//! 2. Validate configuration
//! 3. Spawn the lock engine task
//! 4. Bind the protocol server and start accepting connections
//!
//! ## Shutdown Sequence
//!
//! 1. Stop accepting connections
//! 2. Stop the lock engine; queued requests are answered with an error
//! 3. Dump the final metrics at `debug`
//!
//! ```text
//! client ──TCP──→ LockServer ──→ SessionRegistry
//!                     │                │
//!                     └──commands──→ LockService (engine task)
//! ```

pub mod container;

use std::net::SocketAddr;
use std::sync::Arc;

use ql_01_lock_engine::{LockCoordinationApi, LockService, LockServiceHandle};
use ql_02_lock_server::{LockServer, ServerError, SessionRegistry};
use quantum_telemetry::encode_metrics;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub use container::{ConfigError, RuntimeConfig};

/// Runtime startup failures.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

/// The running service: one engine task and one protocol server.
pub struct LockRuntime {
    engine: LockServiceHandle,
    engine_task: JoinHandle<()>,
    server: LockServer,
    local_addr: SocketAddr,
}

impl LockRuntime {
    /// Validate `config`, spawn the engine and bind the server.
    pub async fn start(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        info!("===========================================");
        info!("  Quantum-Lock Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let (engine, engine_task) = LockService::spawn(config.engine.clone());
        let api: Arc<dyn LockCoordinationApi> = Arc::new(engine.clone());

        let mut server = match LockServer::new(config.server.clone(), api) {
            Ok(server) => server,
            Err(e) => {
                engine_task.abort();
                return Err(e.into());
            }
        };
        let local_addr = match server.start().await {
            Ok(addr) => addr,
            Err(e) => {
                engine_task.abort();
                return Err(e.into());
            }
        };

        info!(
            addr = %local_addr,
            dispose_timeout_ms = config.server.default_dispose_timeout_ms,
            max_timeout_secs = config.engine.max_timeout_secs,
            "Lock runtime started"
        );

        Ok(Self {
            engine,
            engine_task,
            server,
            local_addr,
        })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Direct handle to the engine, bypassing the protocol.
    pub fn engine(&self) -> &LockServiceHandle {
        &self.engine
    }

    /// Client sessions known to the server.
    pub fn sessions(&self) -> Arc<SessionRegistry> {
        self.server.sessions()
    }

    /// Stop accepting connections, then stop the engine.
    pub async fn shutdown(mut self) {
        info!("Initiating graceful shutdown...");

        self.server.shutdown();
        if let Err(e) = self.server.stopped().await {
            error!("Accept loop ended abnormally: {}", e);
        }

        self.engine_task.abort();
        let _ = self.engine_task.await;

        match encode_metrics() {
            Ok(text) if !text.is_empty() => debug!(metrics = %text, "Final metrics"),
            Ok(_) => {}
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }

        info!("Shutdown complete");
    }
}
