//! Domain types for the lock server.
//!
//! Configuration, error types and the session registry.

pub mod config;
pub mod error;
pub mod session;

// Re-exports for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::{CommandError, ResumeError, ServerError};
pub use session::SessionRegistry;
