//! QL-Admin: Quantum-Lock admin client
//!
//! Queries a running lock server over its own line protocol.
//!
//! ```text
//! ql-admin stats            ->  200 STATS / STAT ... / END
//! ql-admin debug            ->  200 DEBUG / LOCK ... / END
//! ql-admin send "lock a"    ->  200 OK
//! ```

pub mod api;

pub use api::{AdminClient, ApiError, Reply, ServerStats, StatusLine};
