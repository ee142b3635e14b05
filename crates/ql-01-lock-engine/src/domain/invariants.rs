//! Domain invariants for the lock table
//!
//! Checked by the coordinator's `check_invariants` and exercised after every
//! step of the randomized tests.

use super::entities::Lock;
use super::value_objects::LockKey;
use shared_types::{LockKind, SessionId};
use std::collections::{HashMap, HashSet};

/// An exclusive lock never has more than one owner.
pub fn invariant_exclusive_single_owner<H>(lock: &Lock<H>) -> bool {
    lock.kind() != LockKind::Exclusive || lock.owners().len() <= 1
}

/// A lock in the table always has an owner; idle locks are discarded.
pub fn invariant_owned_while_alive<H>(lock: &Lock<H>) -> bool {
    !lock.owners().is_empty()
}

/// A session appears at most once in a queue and never while owning.
pub fn invariant_queue_disjoint<H>(lock: &Lock<H>) -> bool {
    let mut seen = HashSet::new();
    lock.queued_sessions()
        .all(|session| !lock.is_owned_by(session) && seen.insert(session))
}

/// Every queued request is indexed under its session, and nothing else is.
pub fn invariant_pending_index<'a, H: 'a>(
    locks: impl IntoIterator<Item = &'a Lock<H>>,
    waiting: &HashMap<SessionId, LockKey>,
) -> bool {
    let mut queued = 0;
    for lock in locks {
        for session in lock.queued_sessions() {
            queued += 1;
            if waiting.get(&session) != Some(lock.key()) {
                return false;
            }
        }
    }
    queued == waiting.len()
}
