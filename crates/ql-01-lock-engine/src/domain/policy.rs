//! Lock kind policies
//!
//! A policy answers two questions for its lock: can a request be decided
//! without waiting, and which queued requests win when the lock frees up.

use super::value_objects::{ImmediateResult, LockParams, LockValue};
use shared_types::{LockKind, SessionId};
use std::collections::{BTreeSet, VecDeque};

/// Anything sitting in a lock queue.
pub trait QueuedRequest {
    fn params(&self) -> &LockParams;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockPolicy {
    /// One owner at a time; re-acquisition by the owner is idempotent.
    Exclusive,
    /// Any number of owners, all agreeing on `value`.
    Value { value: LockValue },
}

impl LockPolicy {
    pub fn for_params(params: &LockParams) -> Self {
        match params {
            LockParams::Exclusive => LockPolicy::Exclusive,
            LockParams::Value(value) => LockPolicy::Value {
                value: value.clone(),
            },
        }
    }

    pub fn kind(&self) -> LockKind {
        match self {
            LockPolicy::Exclusive => LockKind::Exclusive,
            LockPolicy::Value { .. } => LockKind::Value,
        }
    }

    pub fn value(&self) -> Option<&LockValue> {
        match self {
            LockPolicy::Exclusive => None,
            LockPolicy::Value { value } => Some(value),
        }
    }

    /// Decide a request against a lock with at least one owner.
    pub fn immediate_result(
        &self,
        owners: &BTreeSet<SessionId>,
        session: SessionId,
        params: &LockParams,
    ) -> ImmediateResult {
        match self {
            LockPolicy::Exclusive => {
                if owners.contains(&session) {
                    ImmediateResult::Grant
                } else {
                    ImmediateResult::Undetermined
                }
            }
            LockPolicy::Value { value } => {
                if params.value() == Some(value) {
                    ImmediateResult::Grant
                } else if owners.contains(&session) {
                    // An owner asking for another value would contradict itself.
                    ImmediateResult::Reject
                } else {
                    ImmediateResult::Undetermined
                }
            }
        }
    }

    /// Take on the value of the first owner of a fresh lock.
    pub fn adopt(&mut self, params: &LockParams) {
        if let (LockPolicy::Value { value }, LockParams::Value(requested)) = (self, params) {
            *value = requested.clone();
        }
    }

    /// Remove and return the requests to grant once the lock has no owners.
    ///
    /// Exclusive grants the queue head. Value adopts the head's value and
    /// grants every queued request asking for it; the rest keep their order.
    pub fn acquire_next<W: QueuedRequest>(&mut self, queue: &mut VecDeque<W>) -> Vec<W> {
        match self {
            LockPolicy::Exclusive => queue.pop_front().into_iter().collect(),
            LockPolicy::Value { value } => {
                let Some(next) = queue.front().and_then(|head| head.params().value()) else {
                    return Vec::new();
                };
                *value = next.clone();

                let (granted, remaining): (Vec<W>, Vec<W>) = queue
                    .drain(..)
                    .partition(|wait| wait.params().value() == Some(&*value));
                queue.extend(remaining);
                granted
            }
        }
    }
}
