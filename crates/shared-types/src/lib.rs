//! # Shared Types Crate
//!
//! Types exchanged between the lock engine (`ql-01`), the protocol server
//! (`ql-02`) and the tooling around them.
//!
//! ## Design Principles
//!
//! - **Opaque Sessions**: the engine only compares and hashes `SessionId`s; it
//!   never allocates or disposes them.
//! - **One Response Shape**: every operation resolves to a `LockResponse`
//!   (`code` + `message`), which is also the wire representation.

pub mod entities;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use errors::*;
pub use ipc::*;
