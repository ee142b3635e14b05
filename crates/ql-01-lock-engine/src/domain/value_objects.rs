//! Value objects for the lock engine

use serde::{Deserialize, Serialize};
use shared_types::{LockKind, SessionId};
use std::fmt;
use std::time::Duration;

/// Name of a lock.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockKey(String);

impl LockKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LockKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for LockKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value agreed on by the owners of a value-consensus lock.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockValue(String);

impl LockValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LockValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LockValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific parameters of an acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockParams {
    Exclusive,
    Value(LockValue),
}

impl LockParams {
    pub fn kind(&self) -> LockKind {
        match self {
            LockParams::Exclusive => LockKind::Exclusive,
            LockParams::Value(_) => LockKind::Value,
        }
    }

    pub fn value(&self) -> Option<&LockValue> {
        match self {
            LockParams::Exclusive => None,
            LockParams::Value(value) => Some(value),
        }
    }
}

/// Identity of one queued request.
///
/// Timers carry the ticket rather than the session so that a late timer can
/// never cancel a newer request the same session made on the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaitTicket(u64);

impl WaitTicket {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Payload of an armed timeout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitExpiry {
    pub key: LockKey,
    pub ticket: WaitTicket,
}

/// Verdict of a kind policy before any queueing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImmediateResult {
    Grant,
    Reject,
    Undetermined,
}

/// One acquisition attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquireRequest {
    pub session: SessionId,
    pub key: LockKey,
    pub params: LockParams,
    /// Zero means "try, do not wait".
    pub timeout: Duration,
}

impl AcquireRequest {
    pub fn exclusive(session: SessionId, key: impl Into<LockKey>, timeout: Duration) -> Self {
        Self {
            session,
            key: key.into(),
            params: LockParams::Exclusive,
            timeout,
        }
    }

    pub fn value(
        session: SessionId,
        key: impl Into<LockKey>,
        value: impl Into<LockValue>,
        timeout: Duration,
    ) -> Self {
        Self {
            session,
            key: key.into(),
            params: LockParams::Value(value.into()),
            timeout,
        }
    }
}

/// One edge pair of the wait-for graph: `key` is held by `owner`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitHop {
    pub key: LockKey,
    pub owner: SessionId,
}

/// A wait-for cycle that would close if the requester were queued.
///
/// Renders as `#2 => B = #1 => A = #2`: the requester, then for every hop the
/// lock that is waited on and the session holding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadlockChain {
    pub requester: SessionId,
    pub hops: Vec<WaitHop>,
}

impl DeadlockChain {
    pub fn keys(&self) -> impl Iterator<Item = &LockKey> {
        self.hops.iter().map(|hop| &hop.key)
    }

    pub fn sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        std::iter::once(self.requester).chain(self.hops.iter().map(|hop| hop.owner))
    }
}

impl fmt::Display for DeadlockChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.requester)?;
        for hop in &self.hops {
            write!(f, " => {} = {}", hop.key, hop.owner)?;
        }
        Ok(())
    }
}

/// Point-in-time view of a lock, for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LockSnapshot {
    pub key: LockKey,
    pub kind: LockKind,
    pub owners: Vec<SessionId>,
    pub value: Option<LockValue>,
    /// Queued sessions in arrival order
    pub queued: Vec<SessionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(raw: u64) -> SessionId {
        SessionId::new(raw)
    }

    #[test]
    fn test_params_kind() {
        assert_eq!(LockParams::Exclusive.kind(), LockKind::Exclusive);
        let params = LockParams::Value("x".into());
        assert_eq!(params.kind(), LockKind::Value);
        assert_eq!(params.value().map(LockValue::as_str), Some("x"));
    }

    #[test]
    fn test_deadlock_chain_display() {
        let chain = DeadlockChain {
            requester: s(2),
            hops: vec![
                WaitHop { key: "B".into(), owner: s(1) },
                WaitHop { key: "A".into(), owner: s(2) },
            ],
        };
        assert_eq!(chain.to_string(), "#2 => B = #1 => A = #2");
        assert_eq!(chain.keys().map(LockKey::as_str).collect::<Vec<_>>(), ["B", "A"]);
        assert_eq!(chain.sessions().collect::<Vec<_>>(), [s(2), s(1), s(2)]);
    }

    #[test]
    fn test_request_builders() {
        let request = AcquireRequest::value(s(3), "K", "v", Duration::from_secs(5));
        assert_eq!(request.key.as_str(), "K");
        assert_eq!(request.params, LockParams::Value(LockValue::new("v")));
        assert_eq!(request.timeout.as_secs(), 5);
    }
}
