//! Lock Coordinator
//!
//! Owns the lock table and both wait-for indexes. Every operation runs to
//! completion on `&mut self`; callers that need concurrency go through
//! [`LockService`](super::service::LockService), which owns the coordinator
//! on a single task.

use crate::algorithms::deadlock::{detect_deadlock, WaitForGraph};
use crate::config::EngineConfig;
use crate::domain::entities::{Lock, PendingWait, Release};
use crate::domain::errors::LockError;
use crate::domain::invariants::{
    invariant_exclusive_single_owner, invariant_owned_while_alive, invariant_pending_index,
    invariant_queue_disjoint,
};
use crate::domain::policy::LockPolicy;
use crate::domain::value_objects::{
    AcquireRequest, ImmediateResult, LockKey, LockParams, LockSnapshot, LockValue, WaitExpiry,
    WaitTicket,
};
use crate::ports::outbound::TimeoutScheduler;
use quantum_telemetry::{
    DEADLOCKS_DETECTED, LOCKS_ACTIVE, LOCK_REQUESTS, LOCK_WAITERS, LOCK_WAIT_DURATION,
};
use shared_types::{LockResponse, SessionId};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

pub const LOCK_ACQUIRED: &str = "Lock acquired";
pub const LOCK_RELEASED: &str = "Lock released";

/// Result of an acquisition attempt.
#[derive(Debug)]
pub enum Acquisition {
    /// Decided without waiting.
    Resolved(LockResponse),
    /// Queued; the receiver yields the grant, the timeout, or a cancellation.
    Queued(oneshot::Receiver<LockResponse>),
}

impl Acquisition {
    /// The response, if the attempt did not queue.
    pub fn resolved(self) -> Option<LockResponse> {
        match self {
            Acquisition::Resolved(response) => Some(response),
            Acquisition::Queued(_) => None,
        }
    }
}

pub struct LockCoordinator<S: TimeoutScheduler> {
    config: EngineConfig,
    scheduler: S,
    locks: HashMap<LockKey, Lock<S::Handle>>,
    /// session -> the one lock it is queued on
    waiting: HashMap<SessionId, LockKey>,
    /// session -> locks it owns
    holdings: HashMap<SessionId, BTreeSet<LockKey>>,
    next_ticket: u64,
}

impl<S: TimeoutScheduler> LockCoordinator<S> {
    pub fn new(scheduler: S) -> Self {
        Self::with_config(EngineConfig::default(), scheduler)
    }

    pub fn with_config(config: EngineConfig, scheduler: S) -> Self {
        Self {
            config,
            scheduler,
            locks: HashMap::new(),
            waiting: HashMap::new(),
            holdings: HashMap::new(),
            next_ticket: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn acquire_exclusive(
        &mut self,
        session: SessionId,
        key: impl Into<LockKey>,
        timeout: Duration,
    ) -> Acquisition {
        self.acquire(AcquireRequest::exclusive(session, key, timeout))
    }

    pub fn acquire_value(
        &mut self,
        session: SessionId,
        key: impl Into<LockKey>,
        value: impl Into<LockValue>,
        timeout: Duration,
    ) -> Acquisition {
        self.acquire(AcquireRequest::value(session, key, value, timeout))
    }

    /// Grant, refuse, or queue one request.
    pub fn acquire(&mut self, request: AcquireRequest) -> Acquisition {
        let kind = request.params.kind();
        let outcome = self.try_acquire(request);

        let label = match &outcome {
            Ok(Acquisition::Resolved(_)) => "granted",
            Ok(Acquisition::Queued(_)) => "queued",
            Err(err) => err.outcome_label(),
        };
        LOCK_REQUESTS.with_label_values(&[kind.as_str(), label]).inc();
        self.publish_gauges();

        outcome.unwrap_or_else(|err| Acquisition::Resolved(err.into()))
    }

    fn try_acquire(&mut self, request: AcquireRequest) -> Result<Acquisition, LockError> {
        let AcquireRequest {
            session,
            key,
            params,
            timeout,
        } = request;

        if timeout > self.config.max_timeout() {
            return Err(LockError::InvalidTimeout {
                requested_secs: timeout.as_secs(),
                max_secs: self.config.max_timeout_secs,
            });
        }
        if let Some(pending) = self.waiting.get(&session) {
            return Err(LockError::RequestInFlight {
                session,
                key: pending.clone(),
            });
        }

        let holders = match self.locks.get(&key) {
            None => None,
            Some(lock) => {
                if lock.kind() != params.kind() {
                    return Err(LockError::WrongLockKind {
                        key,
                        existing: lock.kind(),
                        requested: params.kind(),
                    });
                }
                match lock.immediate_result(session, &params) {
                    ImmediateResult::Grant => None,
                    ImmediateResult::Reject => {
                        return Err(LockError::AlreadyLocked {
                            holders: lock.holders(),
                        })
                    }
                    ImmediateResult::Undetermined => Some(lock.holders()),
                }
            }
        };

        let Some(holders) = holders else {
            self.lock_entry(&key, &params).grant(session, &params);
            self.holdings.entry(session).or_default().insert(key.clone());
            debug!(session = %session, key = %key, "Lock granted");
            return Ok(Acquisition::Resolved(LockResponse::ok(LOCK_ACQUIRED)));
        };

        if let Some(chain) = detect_deadlock(&*self, session, &key) {
            DEADLOCKS_DETECTED.inc();
            warn!(session = %session, key = %key, chain = %chain, "Deadlock detected");
            return Err(LockError::Deadlock { chain });
        }

        if timeout.is_zero() {
            return Err(LockError::AlreadyLocked { holders });
        }

        let ticket = self.issue_ticket();
        let (responder, receiver) = oneshot::channel();
        let timer = self.scheduler.arm(
            WaitExpiry {
                key: key.clone(),
                ticket,
            },
            timeout,
        );
        self.lock_entry(&key, &params)
            .enqueue(PendingWait::new(ticket, session, params, responder).with_timer(timer));
        self.waiting.insert(session, key.clone());

        debug!(
            session = %session,
            key = %key,
            timeout_ms = timeout.as_millis() as u64,
            "Lock request queued"
        );
        Ok(Acquisition::Queued(receiver))
    }

    /// Release one lock held by `session`.
    ///
    /// Releasing a key that is not alive succeeds; releasing a live lock the
    /// session does not own is refused with 403.
    pub fn release(&mut self, session: SessionId, key: &LockKey) -> LockResponse {
        let Some(lock) = self.locks.get_mut(key) else {
            return LockResponse::ok(LOCK_RELEASED);
        };

        match lock.release(session) {
            Release::NotOwner => LockError::NotOwner {
                holders: lock.holders(),
            }
            .into(),
            outcome => {
                self.settle_release(key, session, outcome);
                self.publish_gauges();
                debug!(session = %session, key = %key, "Lock released");
                LockResponse::ok(LOCK_RELEASED)
            }
        }
    }

    /// Withdraw the session's queued request, then release every lock it owns.
    pub fn release_all(&mut self, session: SessionId) {
        if let Some(key) = self.waiting.remove(&session) {
            if let Some(lock) = self.locks.get_mut(&key) {
                if let Some(mut wait) = lock.remove_waiting(session) {
                    if let Some(timer) = wait.take_timer() {
                        self.scheduler.disarm(timer);
                    }
                    wait.resolve(LockError::Cancelled.into());
                }
            }
            self.drop_if_idle(&key);
        }

        let owned = self.holdings.remove(&session).unwrap_or_default();
        for key in owned {
            let Some(lock) = self.locks.get_mut(&key) else {
                continue;
            };
            let outcome = lock.release(session);
            self.settle_release(&key, session, outcome);
        }

        self.publish_gauges();
        debug!(session = %session, "All locks released");
    }

    /// Resolve a timed-out request. Stale expiries are ignored.
    pub fn expire(&mut self, expiry: WaitExpiry) {
        let WaitExpiry { key, ticket } = expiry;
        let Some(lock) = self.locks.get_mut(&key) else {
            return;
        };
        let Some(wait) = lock.take_ticket(ticket) else {
            debug!(key = %key, ticket = ticket.get(), "Stale lock timeout ignored");
            return;
        };

        let holders = lock.holders();
        let kind = lock.kind();
        let session = wait.session();
        self.waiting.remove(&session);
        self.drop_if_idle(&key);

        LOCK_REQUESTS.with_label_values(&[kind.as_str(), "timeout"]).inc();
        LOCK_WAIT_DURATION.observe(wait.waited().as_secs_f64());
        self.publish_gauges();

        debug!(session = %session, key = %key, "Lock request timed out");
        if !wait.resolve(LockError::TimedOut { holders }.into()) {
            debug!(session = %session, key = %key, "Timed-out requester already gone");
        }
    }

    pub fn has_any_lock(&self, session: SessionId) -> bool {
        self.holdings
            .get(&session)
            .is_some_and(|keys| !keys.is_empty())
    }

    /// Number of live locks.
    pub fn count(&self) -> usize {
        self.locks.len()
    }

    /// Number of queued requests.
    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    pub fn pending_key(&self, session: SessionId) -> Option<&LockKey> {
        self.waiting.get(&session)
    }

    pub fn snapshot(&self, key: &LockKey) -> Option<LockSnapshot> {
        self.locks.get(key).map(Lock::snapshot)
    }

    /// Emit `LOCK <key> <holders>` per live lock, then `REQUEST <session> <key>`
    /// per queued request, each group sorted.
    pub fn describe(&self, mut emit: impl FnMut(String)) {
        let mut locks: Vec<&Lock<S::Handle>> = self.locks.values().collect();
        locks.sort_by(|a, b| a.key().cmp(b.key()));
        for lock in locks {
            emit(format!("LOCK {} {}", lock.key(), lock.holders()));
        }

        let mut requests: Vec<(&SessionId, &LockKey)> = self.waiting.iter().collect();
        requests.sort();
        for (session, key) in requests {
            emit(format!("REQUEST {session} {key}"));
        }
    }

    /// Check the table against every domain invariant.
    pub fn check_invariants(&self) -> bool {
        let per_lock = self.locks.values().all(|lock| {
            invariant_exclusive_single_owner(lock)
                && invariant_owned_while_alive(lock)
                && invariant_queue_disjoint(lock)
        });
        let holdings_match = self.locks.values().all(|lock| {
            lock.owners().iter().all(|owner| {
                self.holdings
                    .get(owner)
                    .is_some_and(|keys| keys.contains(lock.key()))
            })
        }) && self.holdings.iter().all(|(session, keys)| {
            keys.iter().all(|key| {
                self.locks
                    .get(key)
                    .is_some_and(|lock| lock.is_owned_by(*session))
            })
        });

        per_lock && holdings_match && invariant_pending_index(self.locks.values(), &self.waiting)
    }

    fn lock_entry(&mut self, key: &LockKey, params: &LockParams) -> &mut Lock<S::Handle> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Lock::new(key.clone(), LockPolicy::for_params(params)))
    }

    fn issue_ticket(&mut self) -> WaitTicket {
        self.next_ticket += 1;
        WaitTicket::new(self.next_ticket)
    }

    fn settle_release(&mut self, key: &LockKey, session: SessionId, outcome: Release<S::Handle>) {
        self.forget_holding(session, key);
        match outcome {
            Release::NotOwner | Release::StillHeld => {}
            Release::Idle => {
                self.locks.remove(key);
            }
            Release::Handover(winners) => {
                for wait in winners {
                    self.complete_grant(key, wait);
                }
            }
        }
    }

    fn complete_grant(&mut self, key: &LockKey, mut wait: PendingWait<S::Handle>) {
        if let Some(timer) = wait.take_timer() {
            self.scheduler.disarm(timer);
        }
        let session = wait.session();
        self.waiting.remove(&session);
        self.holdings.entry(session).or_default().insert(key.clone());
        LOCK_WAIT_DURATION.observe(wait.waited().as_secs_f64());

        debug!(session = %session, key = %key, "Queued lock request granted");
        if !wait.resolve(LockResponse::ok(LOCK_ACQUIRED)) {
            debug!(session = %session, key = %key, "Grantee went away before notification");
        }
    }

    fn forget_holding(&mut self, session: SessionId, key: &LockKey) {
        if let Some(keys) = self.holdings.get_mut(&session) {
            keys.remove(key);
            if keys.is_empty() {
                self.holdings.remove(&session);
            }
        }
    }

    fn drop_if_idle(&mut self, key: &LockKey) {
        if self.locks.get(key).is_some_and(Lock::is_idle) {
            self.locks.remove(key);
        }
    }

    fn publish_gauges(&self) {
        LOCKS_ACTIVE.set(self.locks.len() as f64);
        LOCK_WAITERS.set(self.waiting.len() as f64);
    }
}

impl<S: TimeoutScheduler> WaitForGraph for LockCoordinator<S> {
    fn owners(&self, key: &LockKey) -> Option<&BTreeSet<SessionId>> {
        self.locks.get(key).map(Lock::owners)
    }

    fn waiting_on(&self, session: SessionId) -> Option<&LockKey> {
        self.waiting.get(&session)
    }
}
