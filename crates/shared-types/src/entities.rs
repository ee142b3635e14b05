//! # Core Entities
//!
//! - `SessionId`: opaque identity of a client session
//! - `LockKind`: the two lock semantics a key can be bound to

use crate::errors::SessionIdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a client session.
///
/// Assigned monotonically by the session registry starting at 1. Rendered as
/// `#<n>` in diagnostics, which is the form every owner list uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SessionId(u64);

impl SessionId {
    /// The first id handed out by a fresh registry.
    pub const FIRST: SessionId = SessionId(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value, as reported by `conn_id`.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    /// Accepts only a plain positive decimal integer (no sign, no spaces).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SessionIdError::Malformed(s.to_string()));
        }
        let raw: u64 = s
            .parse()
            .map_err(|_| SessionIdError::Malformed(s.to_string()))?;
        if raw == 0 {
            return Err(SessionIdError::Zero);
        }
        Ok(Self(raw))
    }
}

/// Semantics a lock key is bound to for as long as the lock is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    /// At most one owner.
    Exclusive,
    /// Any number of owners agreeing on one value.
    Value,
}

impl LockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LockKind::Exclusive => "exclusive",
            LockKind::Value => "value",
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId::new(7).to_string(), "#7");
        assert_eq!(SessionId::FIRST.next().get(), 2);
    }

    #[test]
    fn test_session_id_parse_accepts_positive_integers() {
        assert_eq!("42".parse::<SessionId>(), Ok(SessionId::new(42)));
        assert_eq!("007".parse::<SessionId>(), Ok(SessionId::new(7)));
    }

    #[test]
    fn test_session_id_parse_rejects_garbage() {
        for input in ["", "-1", "+1", "1.5", "abc", " 1", "NaN"] {
            assert!(
                matches!(input.parse::<SessionId>(), Err(SessionIdError::Malformed(_))),
                "{input:?} should be malformed"
            );
        }
        assert_eq!("0".parse::<SessionId>(), Err(SessionIdError::Zero));
    }

    #[test]
    fn test_session_id_parse_rejects_overflow() {
        assert!("99999999999999999999999".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_lock_kind_serde_roundtrip_names() {
        assert_eq!(
            serde_json::to_string(&LockKind::Exclusive).unwrap(),
            "\"exclusive\""
        );
        assert_eq!(LockKind::Value.to_string(), "value");
    }
}
