//! Lock server - TCP listener and accept loop.

use crate::domain::config::ServerConfig;
use crate::domain::error::ServerError;
use crate::domain::session::SessionRegistry;
use crate::handler::ConnectionHandler;
use ql_01_lock_engine::LockCoordinationApi;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lock protocol server
pub struct LockServer {
    config: ServerConfig,
    handler: Arc<ConnectionHandler>,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    accept_task: Option<JoinHandle<()>>,
}

impl LockServer {
    /// Create a server in front of `engine`
    pub fn new(
        config: ServerConfig,
        engine: Arc<dyn LockCoordinationApi>,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let sessions = Arc::new(SessionRegistry::new(
            Arc::clone(&engine),
            config.default_dispose_timeout(),
        ));
        let handler = Arc::new(ConnectionHandler::new(
            engine,
            sessions,
            config.max_line_length,
        ));

        Ok(Self {
            config,
            handler,
            local_addr: None,
            shutdown_tx: None,
            accept_task: None,
        })
    }

    /// Bind the listener and start accepting connections.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "Lock server bound");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handler = Arc::clone(&self.handler);
        self.accept_task = Some(tokio::spawn(accept_loop(listener, handler, shutdown_rx)));
        self.shutdown_tx = Some(shutdown_tx);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn sessions(&self) -> Arc<SessionRegistry> {
        Arc::clone(self.handler.sessions())
    }

    /// Stop accepting connections. Open connections run to completion.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the accept loop to finish.
    pub async fn stopped(&mut self) -> Result<(), ServerError> {
        match self.accept_task.take() {
            Some(task) => task.await.map_err(|e| ServerError::Task(e.to_string())),
            None => Ok(()),
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<ConnectionHandler>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                info!("Lock server stopped accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(error = %e, "Failed to disable Nagle");
                    }
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handler.serve(stream, peer).await {
                            warn!(%peer, error = %e, "Connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept failed");
                }
            },
        }
    }
}
