//! Inbound Ports (Driving Ports / API)

use crate::domain::errors::LockError;
use crate::domain::value_objects::{LockKey, LockValue};
use async_trait::async_trait;
use shared_types::{LockResponse, SessionId};
use std::time::Duration;

/// Lock coordination API used by protocol front-ends.
///
/// Acquire and release always resolve to a `LockResponse`; failures are
/// carried in its code. A zero `timeout` means "do not wait".
#[async_trait]
pub trait LockCoordinationApi: Send + Sync {
    /// Acquire an exclusive lock, waiting up to `timeout`.
    async fn acquire_exclusive(
        &self,
        session: SessionId,
        key: LockKey,
        timeout: Duration,
    ) -> LockResponse;

    /// Acquire a value-consensus lock for `value`, waiting up to `timeout`.
    async fn acquire_value(
        &self,
        session: SessionId,
        key: LockKey,
        value: LockValue,
        timeout: Duration,
    ) -> LockResponse;

    /// Release one lock.
    async fn release(&self, session: SessionId, key: LockKey) -> LockResponse;

    /// Withdraw the session's queued request and release everything it holds.
    async fn release_all(&self, session: SessionId) -> Result<(), LockError>;

    async fn has_any_lock(&self, session: SessionId) -> Result<bool, LockError>;

    /// Number of live locks.
    async fn count(&self) -> Result<usize, LockError>;

    /// Human-readable dump of locks and queued requests.
    async fn describe(&self) -> Result<Vec<String>, LockError>;
}
