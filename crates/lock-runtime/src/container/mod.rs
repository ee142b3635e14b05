//! # Runtime Container
//!
//! Configuration for every component the runtime wires together.

pub mod config;

pub use config::{ConfigError, RuntimeConfig};
