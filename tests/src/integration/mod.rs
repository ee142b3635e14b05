//! # Integration Flows
//!
//! Every test drives a real server over TCP:
//!
//! - `scenarios`: lock semantics (waiting, timeouts, value consensus, deadlock)
//! - `sessions`: connection identity (disconnect, dispose, resume, stats)

pub mod scenarios;
pub mod sessions;
