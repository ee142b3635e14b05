//! # Application Module
//!
//! The single-owner lock coordinator and the task that serializes access to it.

pub mod coordinator;
pub mod service;

pub use coordinator::{Acquisition, LockCoordinator, LOCK_ACQUIRED, LOCK_RELEASED};
pub use service::{LockService, LockServiceHandle};
