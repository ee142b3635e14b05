//! # Error Types
//!
//! Errors raised while decoding shared types from protocol text.

use thiserror::Error;

/// A session identifier could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionIdError {
    /// Input was empty or contained something other than ASCII digits.
    #[error("Invalid session id: {0:?}")]
    Malformed(String),

    /// Session ids are assigned from 1; zero never names a session.
    #[error("Session id must be positive")]
    Zero,
}
