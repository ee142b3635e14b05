//! Client for the lock server's line protocol.
//!
//! Speaks the same commands a lock client does, over plain TCP.

mod client;
mod types;

pub use client::{AdminClient, ApiError};
pub use types::*;
