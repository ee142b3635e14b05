//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits on top of the tokio runtime.

pub mod timer;

pub use timer::TokioTimeoutScheduler;
