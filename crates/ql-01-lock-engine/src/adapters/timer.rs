//! Tokio-backed timeout scheduler

use crate::domain::value_objects::WaitExpiry;
use crate::ports::outbound::TimeoutScheduler;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

/// Spawns one sleeping task per armed timeout and sends the expiry on the
/// channel the lock service listens to.
#[derive(Debug, Clone)]
pub struct TokioTimeoutScheduler {
    expiries: mpsc::UnboundedSender<WaitExpiry>,
}

impl TokioTimeoutScheduler {
    pub fn new(expiries: mpsc::UnboundedSender<WaitExpiry>) -> Self {
        Self { expiries }
    }

    /// A scheduler together with the receiving end of its expiries.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WaitExpiry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl TimeoutScheduler for TokioTimeoutScheduler {
    type Handle = AbortHandle;

    fn arm(&mut self, expiry: WaitExpiry, after: Duration) -> AbortHandle {
        let expiries = self.expiries.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if expiries.send(expiry).is_err() {
                trace!("Lock service stopped before timeout fired");
            }
        })
        .abort_handle()
    }

    fn disarm(&mut self, handle: AbortHandle) {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::WaitTicket;

    fn expiry(ticket: u64) -> WaitExpiry {
        WaitExpiry {
            key: "A".into(),
            ticket: WaitTicket::new(ticket),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_timer_delivers_expiry() {
        let (mut scheduler, mut expiries) = TokioTimeoutScheduler::channel();
        scheduler.arm(expiry(1), Duration::from_secs(5));

        let delivered = expiries.recv().await;
        assert_eq!(delivered, Some(expiry(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_timer_stays_silent() {
        let (mut scheduler, mut expiries) = TokioTimeoutScheduler::channel();
        let handle = scheduler.arm(expiry(1), Duration::from_secs(5));
        scheduler.arm(expiry(2), Duration::from_secs(10));
        scheduler.disarm(handle);

        assert_eq!(expiries.recv().await, Some(expiry(2)));
    }
}
