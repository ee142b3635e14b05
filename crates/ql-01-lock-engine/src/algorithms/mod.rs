//! Algorithms module for the lock engine
//!
//! Contains:
//! - Wait-for graph deadlock detection

pub mod deadlock;

pub use deadlock::{detect_deadlock, WaitForGraph};
