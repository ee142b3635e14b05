//! Outbound Ports (Driven Ports / SPI)

use crate::domain::value_objects::WaitExpiry;
use std::time::Duration;

/// Delivers a `WaitExpiry` back to the engine once a timeout elapses.
///
/// The engine disarms the handle when the wait resolves some other way.
/// Firing after that point is allowed; the engine ignores stale expiries.
pub trait TimeoutScheduler {
    type Handle;

    fn arm(&mut self, expiry: WaitExpiry, after: Duration) -> Self::Handle;

    fn disarm(&mut self, handle: Self::Handle);
}
