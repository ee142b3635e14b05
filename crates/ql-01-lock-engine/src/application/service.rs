//! Lock Service
//!
//! Runs the [`LockCoordinator`] on one task. Callers talk to it through a
//! cloneable [`LockServiceHandle`]; commands are applied one at a time, so
//! coordinator operations never interleave.

use super::coordinator::{Acquisition, LockCoordinator};
use crate::adapters::timer::TokioTimeoutScheduler;
use crate::config::EngineConfig;
use crate::domain::errors::LockError;
use crate::domain::value_objects::{AcquireRequest, LockKey, LockSnapshot, LockValue, WaitExpiry};
use crate::ports::inbound::LockCoordinationApi;
use async_trait::async_trait;
use shared_types::{LockResponse, SessionId};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Requests understood by the service task.
#[derive(Debug)]
pub enum ServiceCommand {
    Acquire {
        request: AcquireRequest,
        reply: oneshot::Sender<Acquisition>,
    },
    Release {
        session: SessionId,
        key: LockKey,
        reply: oneshot::Sender<LockResponse>,
    },
    ReleaseAll {
        session: SessionId,
        reply: oneshot::Sender<()>,
    },
    HasAnyLock {
        session: SessionId,
        reply: oneshot::Sender<bool>,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
    Describe {
        reply: oneshot::Sender<Vec<String>>,
    },
    Inspect {
        key: LockKey,
        reply: oneshot::Sender<Option<LockSnapshot>>,
    },
}

/// Lock coordination service
pub struct LockService;

impl LockService {
    /// Start the service task on the current tokio runtime.
    pub fn spawn(config: EngineConfig) -> (LockServiceHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(config.command_buffer.max(1));
        let (scheduler, expiries) = TokioTimeoutScheduler::channel();
        let coordinator = LockCoordinator::with_config(config, scheduler);

        let task = tokio::spawn(run(coordinator, commands_rx, expiries));
        info!("Lock service started");
        (
            LockServiceHandle {
                commands: commands_tx,
            },
            task,
        )
    }
}

async fn run(
    mut coordinator: LockCoordinator<TokioTimeoutScheduler>,
    mut commands: mpsc::Receiver<ServiceCommand>,
    mut expiries: mpsc::UnboundedReceiver<WaitExpiry>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => apply(&mut coordinator, command),
                None => break,
            },
            Some(expiry) = expiries.recv() => coordinator.expire(expiry),
        }
    }
    info!(
        locks = coordinator.count(),
        waiting = coordinator.waiting_count(),
        "Lock service stopped"
    );
}

fn apply(coordinator: &mut LockCoordinator<TokioTimeoutScheduler>, command: ServiceCommand) {
    // A dropped reply receiver means the caller gave up; nothing to do.
    match command {
        ServiceCommand::Acquire { request, reply } => {
            let _ = reply.send(coordinator.acquire(request));
        }
        ServiceCommand::Release {
            session,
            key,
            reply,
        } => {
            let _ = reply.send(coordinator.release(session, &key));
        }
        ServiceCommand::ReleaseAll { session, reply } => {
            coordinator.release_all(session);
            let _ = reply.send(());
        }
        ServiceCommand::HasAnyLock { session, reply } => {
            let _ = reply.send(coordinator.has_any_lock(session));
        }
        ServiceCommand::Count { reply } => {
            let _ = reply.send(coordinator.count());
        }
        ServiceCommand::Describe { reply } => {
            let mut lines = Vec::new();
            coordinator.describe(|line| lines.push(line));
            let _ = reply.send(lines);
        }
        ServiceCommand::Inspect { key, reply } => {
            let _ = reply.send(coordinator.snapshot(&key));
        }
    }
}

/// Cloneable client of the lock service.
#[derive(Debug, Clone)]
pub struct LockServiceHandle {
    commands: mpsc::Sender<ServiceCommand>,
}

impl LockServiceHandle {
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ServiceCommand,
    ) -> Result<T, LockError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| LockError::ServiceUnavailable)?;
        response.await.map_err(|_| LockError::ServiceUnavailable)
    }

    /// Submit a request and wait for its final response.
    pub async fn acquire(&self, request: AcquireRequest) -> LockResponse {
        match self
            .call(|reply| ServiceCommand::Acquire { request, reply })
            .await
        {
            Ok(Acquisition::Resolved(response)) => response,
            Ok(Acquisition::Queued(waiter)) => {
                debug!("Waiting for queued lock request");
                waiter
                    .await
                    .unwrap_or_else(|_| LockError::Cancelled.into())
            }
            Err(err) => err.into(),
        }
    }

    /// Snapshot of one lock.
    pub async fn inspect(&self, key: LockKey) -> Result<Option<LockSnapshot>, LockError> {
        self.call(|reply| ServiceCommand::Inspect { key, reply }).await
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

#[async_trait]
impl LockCoordinationApi for LockServiceHandle {
    async fn acquire_exclusive(
        &self,
        session: SessionId,
        key: LockKey,
        timeout: Duration,
    ) -> LockResponse {
        self.acquire(AcquireRequest::exclusive(session, key, timeout))
            .await
    }

    async fn acquire_value(
        &self,
        session: SessionId,
        key: LockKey,
        value: LockValue,
        timeout: Duration,
    ) -> LockResponse {
        self.acquire(AcquireRequest::value(session, key, value, timeout))
            .await
    }

    async fn release(&self, session: SessionId, key: LockKey) -> LockResponse {
        self.call(|reply| ServiceCommand::Release {
            session,
            key,
            reply,
        })
        .await
        .unwrap_or_else(LockResponse::from)
    }

    async fn release_all(&self, session: SessionId) -> Result<(), LockError> {
        self.call(|reply| ServiceCommand::ReleaseAll { session, reply })
            .await
    }

    async fn has_any_lock(&self, session: SessionId) -> Result<bool, LockError> {
        self.call(|reply| ServiceCommand::HasAnyLock { session, reply })
            .await
    }

    async fn count(&self) -> Result<usize, LockError> {
        self.call(|reply| ServiceCommand::Count { reply }).await
    }

    async fn describe(&self) -> Result<Vec<String>, LockError> {
        self.call(|reply| ServiceCommand::Describe { reply }).await
    }
}
