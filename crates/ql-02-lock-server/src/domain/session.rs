//! Session Registry - identity and lifetime of client sessions.
//!
//! A session outlives its TCP connection: on disconnect it is kept for its
//! dispose delay, during which another connection may resume it with
//! `conn_id <id>`. Disposal releases everything the session held in the
//! lock engine. Lock state itself never lives here.

use super::error::ResumeError;
use parking_lot::Mutex;
use ql_01_lock_engine::LockCoordinationApi;
use quantum_telemetry::SESSIONS_CONNECTED;
use shared_types::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

struct SessionEntry {
    dispose_after: Duration,
    connected: bool,
    dispose_timer: Option<AbortHandle>,
}

struct RegistryState {
    last_id: SessionId,
    sessions: HashMap<SessionId, SessionEntry>,
}

pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    engine: Arc<dyn LockCoordinationApi>,
    default_dispose: Duration,
}

impl SessionRegistry {
    pub fn new(engine: Arc<dyn LockCoordinationApi>, default_dispose: Duration) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                last_id: SessionId::new(0),
                sessions: HashMap::new(),
            }),
            engine,
            default_dispose,
        }
    }

    /// Register a new connected session.
    pub fn open(&self) -> SessionId {
        let mut state = self.state.lock();
        let id = state.last_id.next();
        state.last_id = id;
        state.sessions.insert(
            id,
            SessionEntry {
                dispose_after: self.default_dispose,
                connected: true,
                dispose_timer: None,
            },
        );
        SESSIONS_CONNECTED.inc();
        id
    }

    /// Sessions known to the registry, connected or awaiting disposal.
    pub fn count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.state.lock().sessions.contains_key(&id)
    }

    pub fn is_connected(&self, id: SessionId) -> bool {
        self.state
            .lock()
            .sessions
            .get(&id)
            .is_some_and(|entry| entry.connected)
    }

    pub fn set_dispose_timeout(&self, id: SessionId, after: Duration) {
        if let Some(entry) = self.state.lock().sessions.get_mut(&id) {
            entry.dispose_after = after;
        }
    }

    /// The connection of `id` closed: dispose now, or arm the dispose timer.
    pub async fn disconnect(self: &Arc<Self>, id: SessionId) {
        SESSIONS_CONNECTED.dec();

        let after = {
            let mut state = self.state.lock();
            let Some(entry) = state.sessions.get_mut(&id) else {
                return;
            };
            entry.connected = false;
            if !entry.dispose_after.is_zero() {
                let registry = Arc::clone(self);
                let after = entry.dispose_after;
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    registry.dispose(id).await;
                });
                entry.dispose_timer = Some(timer.abort_handle());
            }
            entry.dispose_after
        };

        if after.is_zero() {
            self.dispose(id).await;
        } else {
            info!(session = %id, after_ms = after.as_millis() as u64, "Session will be disposed");
        }
    }

    /// Forget the session and release everything it held or waited for.
    /// A session that was resumed in the meantime is left alone.
    async fn dispose(&self, id: SessionId) {
        let removed = {
            let mut state = self.state.lock();
            let disposable = state.sessions.get(&id).is_some_and(|entry| !entry.connected);
            if disposable {
                state.sessions.remove(&id);
            }
            disposable
        };
        if !removed {
            return;
        }
        info!(session = %id, "Session disposed");
        if let Err(err) = self.engine.release_all(id).await {
            warn!(session = %id, error = %err, "Failed to release locks of disposed session");
        }
    }

    /// Move the connection of `current` over to the disconnected `target`.
    ///
    /// On success `current` is forgotten, any request it still has queued is
    /// withdrawn, and the caller continues as `target`, keeping its own
    /// dispose delay.
    pub async fn resume(&self, current: SessionId, target: SessionId) -> Result<(), ResumeError> {
        if current == target {
            return Ok(());
        }
        if self.engine.has_any_lock(current).await? {
            return Err(ResumeError::HoldsLocks);
        }

        {
            let mut state = self.state.lock();
            let entry = state.sessions.get_mut(&target).ok_or(ResumeError::Disposed)?;
            if entry.connected {
                return Err(ResumeError::StillActive);
            }
            entry.connected = true;
            if let Some(timer) = entry.dispose_timer.take() {
                timer.abort();
            }

            let dispose_after = state
                .sessions
                .remove(&current)
                .map_or(self.default_dispose, |entry| entry.dispose_after);
            if let Some(entry) = state.sessions.get_mut(&target) {
                entry.dispose_after = dispose_after;
            }
        }

        // `current` no longer has a registry entry, so nothing would ever
        // dispose a request it still has queued.
        if let Err(err) = self.engine.release_all(current).await {
            warn!(
                session = %current,
                error = %err,
                "Failed to withdraw requests of resumed-away session"
            );
        }

        debug!(from = %current, to = %target, "Session resumed");
        Ok(())
    }
}
