//! # Response Types
//!
//! Every engine operation resolves to a `LockResponse`. The protocol server
//! writes it verbatim as one `"<code> <message>"` line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result code of a lock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ResponseCode {
    /// Lock acquired, released, or command succeeded.
    Ok = 200,
    /// Release by a non-owner, or session resumption blocked.
    Forbidden = 403,
    /// Held by an incompatible owner, or the wait timed out.
    Conflict = 409,
    /// Granting the request would close a wait-for cycle.
    Deadlock = 423,
    /// Malformed request or wrong lock kind for an existing key.
    InternalError = 500,
}

impl ResponseCode {
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Message used when a response carries none.
    pub fn default_message(self) -> &'static str {
        match self {
            ResponseCode::Ok => "OK",
            _ => "Internal server error",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// `(code, message)` pair returned by the lock engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockResponse {
    pub code: ResponseCode,
    pub message: String,
}

impl LockResponse {
    pub fn new(code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(ResponseCode::Ok, message)
    }

    /// A bare status; renders with the code's default message.
    pub fn status(code: ResponseCode) -> Self {
        Self::new(code, String::new())
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResponseCode::Ok
    }

    /// Wire form, without the line terminator.
    pub fn to_line(&self) -> String {
        let message = if self.message.is_empty() {
            self.code.default_message()
        } else {
            self.message.as_str()
        };
        format!("{} {}", self.code, message)
    }
}

impl fmt::Display for LockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
