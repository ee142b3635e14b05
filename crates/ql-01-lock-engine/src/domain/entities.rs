//! Domain entities for the lock engine

use super::policy::{LockPolicy, QueuedRequest};
use super::value_objects::{
    ImmediateResult, LockKey, LockParams, LockSnapshot, LockValue, WaitTicket,
};
use shared_types::{LockKind, LockResponse, SessionId};
use std::collections::{BTreeSet, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// A request parked in a lock queue.
///
/// `H` is the handle of the armed timeout, if any.
#[derive(Debug)]
pub struct PendingWait<H> {
    ticket: WaitTicket,
    session: SessionId,
    params: LockParams,
    enqueued_at: Instant,
    responder: oneshot::Sender<LockResponse>,
    timer: Option<H>,
}

impl<H> PendingWait<H> {
    pub fn new(
        ticket: WaitTicket,
        session: SessionId,
        params: LockParams,
        responder: oneshot::Sender<LockResponse>,
    ) -> Self {
        Self {
            ticket,
            session,
            params,
            enqueued_at: Instant::now(),
            responder,
            timer: None,
        }
    }

    pub fn with_timer(mut self, timer: H) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn ticket(&self) -> WaitTicket {
        self.ticket
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn waited(&self) -> Duration {
        self.enqueued_at.elapsed()
    }

    pub fn take_timer(&mut self) -> Option<H> {
        self.timer.take()
    }

    /// Deliver the final response. Returns `false` if the caller went away.
    pub fn resolve(self, response: LockResponse) -> bool {
        self.responder.send(response).is_ok()
    }
}

impl<H> QueuedRequest for PendingWait<H> {
    fn params(&self) -> &LockParams {
        &self.params
    }
}

/// Outcome of removing one owner.
#[derive(Debug)]
pub enum Release<H> {
    /// The session did not own the lock; nothing changed.
    NotOwner,
    /// Other owners remain.
    StillHeld,
    /// No owners and nobody waiting: the lock should be discarded.
    Idle,
    /// Ownership passed to these waiters.
    Handover(Vec<PendingWait<H>>),
}

/// A live lock: its owners, its kind policy and its wait queue.
#[derive(Debug)]
pub struct Lock<H> {
    key: LockKey,
    owners: BTreeSet<SessionId>,
    policy: LockPolicy,
    queue: VecDeque<PendingWait<H>>,
}

impl<H> Lock<H> {
    pub fn new(key: LockKey, policy: LockPolicy) -> Self {
        Self {
            key,
            owners: BTreeSet::new(),
            policy,
            queue: VecDeque::new(),
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn kind(&self) -> LockKind {
        self.policy.kind()
    }

    pub fn value(&self) -> Option<&LockValue> {
        self.policy.value()
    }

    pub fn owners(&self) -> &BTreeSet<SessionId> {
        &self.owners
    }

    pub fn is_owned_by(&self, session: SessionId) -> bool {
        self.owners.contains(&session)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queued_sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.queue.iter().map(PendingWait::session)
    }

    pub fn is_idle(&self) -> bool {
        self.owners.is_empty() && self.queue.is_empty()
    }

    /// Owners as shown in conflict messages: `#1, #2`, plus ` (value)` for
    /// value locks.
    pub fn holders(&self) -> String {
        let owners = self
            .owners
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match self.policy.value() {
            Some(value) => format!("{owners} ({value})"),
            None => owners,
        }
    }

    pub fn immediate_result(&self, session: SessionId, params: &LockParams) -> ImmediateResult {
        if self.owners.is_empty() {
            return ImmediateResult::Grant;
        }
        self.policy.immediate_result(&self.owners, session, params)
    }

    /// Add an owner. Returns `false` if it already owned the lock.
    pub fn grant(&mut self, session: SessionId, params: &LockParams) -> bool {
        if self.owners.is_empty() {
            self.policy.adopt(params);
        }
        self.owners.insert(session)
    }

    pub fn enqueue(&mut self, wait: PendingWait<H>) {
        self.queue.push_back(wait);
    }

    pub fn remove_waiting(&mut self, session: SessionId) -> Option<PendingWait<H>> {
        let index = self.queue.iter().position(|w| w.session() == session)?;
        self.queue.remove(index)
    }

    pub fn take_ticket(&mut self, ticket: WaitTicket) -> Option<PendingWait<H>> {
        let index = self.queue.iter().position(|w| w.ticket() == ticket)?;
        self.queue.remove(index)
    }

    /// Remove `session` from the owners and, if that empties the lock,
    /// hand it to the next waiters.
    pub fn release(&mut self, session: SessionId) -> Release<H> {
        if !self.owners.remove(&session) {
            return Release::NotOwner;
        }
        if !self.owners.is_empty() {
            return Release::StillHeld;
        }
        if self.queue.is_empty() {
            return Release::Idle;
        }

        let winners = self.policy.acquire_next(&mut self.queue);
        self.owners.extend(winners.iter().map(PendingWait::session));
        if winners.is_empty() {
            Release::Idle
        } else {
            Release::Handover(winners)
        }
    }

    pub fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            key: self.key.clone(),
            kind: self.kind(),
            owners: self.owners.iter().copied().collect(),
            value: self.value().cloned(),
            queued: self.queued_sessions().collect(),
        }
    }
}
