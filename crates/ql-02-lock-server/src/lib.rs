//! QL-02 Lock Server - line-based TCP front-end for the lock engine.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    LOCK SERVER (ql-02)                     │
//! ├───────────────────────────────────────────────────────────┤
//! │  TcpListener :11400 ──► ConnectionHandler (one per conn)  │
//! │                              │          │                 │
//! │                    Command::parse   SessionRegistry       │
//! │                              │     (ids, dispose, resume) │
//! └──────────────────────────────┼──────────┼─────────────────┘
//!                                ▼          ▼
//!                      LockCoordinationApi (ql-01)
//! ```
//!
//! # Protocol
//!
//! One command per line, one `"<code> <message>"` reply per command
//! (`stats` and `debug` reply with a block terminated by `END`):
//!
//! | Command | Reply |
//! |---------|-------|
//! | `lock <key> [timeout]` | `200 Lock acquired`, `409`, `423` |
//! | `lock_value <key> <value> [timeout]` | as `lock` |
//! | `unlock <key>` | `200 Lock released`, `403 Locked by ...` |
//! | `unlock_all`, `quit` | `200 OK` (`quit` then closes) |
//! | `set_timeout <ms>` | `200 OK` |
//! | `conn_id [id]` | `200 <id>`, `200 Resumed`, `403 ...` |
//! | `stats`, `debug` | multi-line block |
//!
//! # Usage
//!
//! ```ignore
//! use ql_02_lock_server::{LockServer, ServerConfig};
//!
//! let mut server = LockServer::new(ServerConfig::default(), engine)?;
//! let addr = server.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod handler;
pub mod protocol;
pub mod service;

// Re-exports for public API
pub use domain::config::{ConfigError, ServerConfig};
pub use domain::error::{CommandError, ResumeError, ServerError};
pub use domain::session::SessionRegistry;
pub use handler::ConnectionHandler;
pub use protocol::{Command, Reply};
pub use service::LockServer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
