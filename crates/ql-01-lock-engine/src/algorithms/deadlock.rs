//! Deadlock detection over the wait-for graph
//!
//! A session waits for a lock; a lock is held by its owners. Queueing a
//! request is a deadlock if, following owners and what they wait for from
//! the requested lock, we arrive back at the requester.

use crate::domain::value_objects::{DeadlockChain, LockKey, WaitHop};
use shared_types::SessionId;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Read access to the two halves of the wait-for graph.
pub trait WaitForGraph {
    /// Owners of a live lock.
    fn owners(&self, key: &LockKey) -> Option<&BTreeSet<SessionId>>;

    /// The lock a session is queued on, if any.
    fn waiting_on(&self, session: SessionId) -> Option<&LockKey>;
}

/// Breadth-first search for a cycle through `requester`.
///
/// Each owner is expanded at most once, so cycles that do not involve the
/// requester cannot trap the search.
pub fn detect_deadlock<'a, G>(
    graph: &'a G,
    requester: SessionId,
    start: &'a LockKey,
) -> Option<DeadlockChain>
where
    G: WaitForGraph + ?Sized,
{
    let mut visited: HashSet<SessionId> = HashSet::new();
    let mut frontier: VecDeque<(&'a LockKey, Vec<WaitHop>)> = VecDeque::new();
    frontier.push_back((start, Vec::new()));

    while let Some((key, path)) = frontier.pop_front() {
        let Some(owners) = graph.owners(key) else {
            continue;
        };

        for &owner in owners {
            let mut hops = path.clone();
            hops.push(WaitHop {
                key: key.clone(),
                owner,
            });

            if owner == requester {
                return Some(DeadlockChain { requester, hops });
            }
            if !visited.insert(owner) {
                continue;
            }
            if let Some(next) = graph.waiting_on(owner) {
                frontier.push_back((next, hops));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapGraph {
        owners: HashMap<LockKey, BTreeSet<SessionId>>,
        waiting: HashMap<SessionId, LockKey>,
    }

    impl MapGraph {
        fn hold(mut self, key: &str, session: u64) -> Self {
            self.owners
                .entry(key.into())
                .or_default()
                .insert(SessionId::new(session));
            self
        }

        fn wait(mut self, session: u64, key: &str) -> Self {
            self.waiting.insert(SessionId::new(session), key.into());
            self
        }
    }

    impl WaitForGraph for MapGraph {
        fn owners(&self, key: &LockKey) -> Option<&BTreeSet<SessionId>> {
            self.owners.get(key)
        }

        fn waiting_on(&self, session: SessionId) -> Option<&LockKey> {
            self.waiting.get(&session)
        }
    }

    fn detect(graph: &MapGraph, requester: u64, key: &str) -> Option<String> {
        let key = LockKey::new(key);
        detect_deadlock(graph, SessionId::new(requester), &key).map(|chain| chain.to_string())
    }

    #[test]
    fn test_two_party_cycle() {
        let graph = MapGraph::default().hold("A", 1).hold("B", 2).wait(1, "B");
        assert_eq!(detect(&graph, 2, "A").as_deref(), Some("#2 => A = #1 => B = #2"));
    }

    #[test]
    fn test_three_party_cycle() {
        let graph = MapGraph::default()
            .hold("A", 1)
            .hold("B", 2)
            .hold("C", 3)
            .wait(1, "B")
            .wait(2, "C");
        assert_eq!(
            detect(&graph, 3, "A").as_deref(),
            Some("#3 => A = #1 => B = #2 => C = #3")
        );
    }

    #[test]
    fn test_plain_contention_is_not_deadlock() {
        let graph = MapGraph::default().hold("A", 1).hold("B", 2).wait(1, "B");
        assert_eq!(detect(&graph, 3, "A"), None);
    }

    #[test]
    fn test_unrelated_cycle_terminates() {
        let graph = MapGraph::default()
            .hold("A", 1)
            .hold("B", 2)
            .wait(1, "B")
            .wait(2, "A");
        assert_eq!(detect(&graph, 3, "A"), None);
    }

    #[test]
    fn test_cycle_through_shared_value_lock() {
        let graph = MapGraph::default()
            .hold("V", 1)
            .hold("V", 2)
            .hold("B", 3)
            .wait(2, "B");
        assert_eq!(detect(&graph, 3, "V").as_deref(), Some("#3 => V = #2 => B = #3"));
    }

    #[test]
    fn test_unknown_key() {
        let graph = MapGraph::default();
        assert_eq!(detect(&graph, 1, "missing"), None);
    }
}
