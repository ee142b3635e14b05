//! Lock server error types.

use super::config::ConfigError;
use ql_01_lock_engine::LockError;
use shared_types::{ResponseCode, SessionIdError};
use std::io;

/// Server-level errors (socket and lifecycle)
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server socket bind error
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Connection I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The accept loop task failed
    #[error("server task failed: {0}")]
    Task(String),
}

/// A protocol line that does not name a known command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {name} with {argc} argument(s)")]
    Unknown { name: String, argc: usize },

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("invalid session id: {0}")]
    InvalidSessionId(#[from] SessionIdError),
}

/// Why `conn_id <id>` could not resume a session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResumeError {
    #[error("Can not resume connection - current connection already acquired locks")]
    HoldsLocks,

    #[error("Can not resume connection - it is already disposed")]
    Disposed,

    #[error("Can not resume connection - it is still active")]
    StillActive,

    #[error(transparent)]
    Engine(#[from] LockError),
}

impl ResumeError {
    pub fn code(&self) -> ResponseCode {
        match self {
            ResumeError::Engine(err) => err.code(),
            _ => ResponseCode::Forbidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_messages() {
        assert_eq!(
            ResumeError::Disposed.to_string(),
            "Can not resume connection - it is already disposed"
        );
        assert_eq!(ResumeError::StillActive.code(), ResponseCode::Forbidden);
        assert_eq!(
            ResumeError::Engine(LockError::ServiceUnavailable).code(),
            ResponseCode::InternalError
        );
    }

    #[test]
    fn test_command_error_display() {
        let err = CommandError::Unknown {
            name: "lok".into(),
            argc: 1,
        };
        assert_eq!(err.to_string(), "unknown command lok with 1 argument(s)");
    }
}
