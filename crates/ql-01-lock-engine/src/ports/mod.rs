//! Ports module for the lock engine
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::LockCoordinationApi;
pub use outbound::TimeoutScheduler;
