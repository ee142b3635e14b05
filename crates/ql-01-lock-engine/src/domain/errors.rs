//! Error types for the lock engine
//!
//! Every error maps onto one protocol response code:
//!
//! | Code | Errors |
//! |------|--------|
//! | 403 | `NotOwner` |
//! | 409 | `AlreadyLocked`, `TimedOut`, `Cancelled` |
//! | 423 | `Deadlock` |
//! | 500 | `WrongLockKind`, `RequestInFlight`, `InvalidTimeout`, `ServiceUnavailable` |

use super::value_objects::{DeadlockChain, LockKey};
use shared_types::{LockKind, LockResponse, ResponseCode, SessionId};
use thiserror::Error;

/// All errors that can occur while acquiring or releasing a lock
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Held by an incompatible owner and the request may not wait
    #[error("Already locked by {holders}")]
    AlreadyLocked { holders: String },

    /// The request waited for its whole timeout
    #[error("Already locked by {holders}")]
    TimedOut { holders: String },

    /// Queueing the request would close a wait-for cycle
    #[error("Deadlock: {chain}")]
    Deadlock { chain: DeadlockChain },

    /// Release attempted by a session that does not own the lock
    #[error("Locked by {holders}")]
    NotOwner { holders: String },

    /// The key is alive with the other lock kind
    #[error("Lock {key} is a {existing} lock, not {requested}")]
    WrongLockKind {
        key: LockKey,
        existing: LockKind,
        requested: LockKind,
    },

    /// The session already has a queued request
    #[error("Session {session} is already waiting for {key}")]
    RequestInFlight { session: SessionId, key: LockKey },

    /// Timeout above the configured maximum
    #[error("Timeout {requested_secs}s exceeds maximum {max_secs}s")]
    InvalidTimeout { requested_secs: u64, max_secs: u64 },

    /// The queued request was withdrawn before it resolved
    #[error("Lock request cancelled")]
    Cancelled,

    /// The lock service task is not running
    #[error("Lock service unavailable")]
    ServiceUnavailable,
}

impl LockError {
    pub fn code(&self) -> ResponseCode {
        match self {
            LockError::AlreadyLocked { .. } | LockError::TimedOut { .. } | LockError::Cancelled => {
                ResponseCode::Conflict
            }
            LockError::Deadlock { .. } => ResponseCode::Deadlock,
            LockError::NotOwner { .. } => ResponseCode::Forbidden,
            LockError::WrongLockKind { .. }
            | LockError::RequestInFlight { .. }
            | LockError::InvalidTimeout { .. }
            | LockError::ServiceUnavailable => ResponseCode::InternalError,
        }
    }

    /// Metric label for the outcome this error represents.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            LockError::AlreadyLocked { .. } => "conflict",
            LockError::TimedOut { .. } => "timeout",
            LockError::Deadlock { .. } => "deadlock",
            LockError::Cancelled => "cancelled",
            _ => "rejected",
        }
    }
}

impl From<LockError> for LockResponse {
    fn from(err: LockError) -> Self {
        LockResponse::new(err.code(), err.to_string())
    }
}
