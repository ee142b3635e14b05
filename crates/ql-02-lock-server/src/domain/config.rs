//! Server configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Lock server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_address: IpAddr,
    /// TCP port (0 picks an ephemeral port)
    pub port: u16,
    /// Delay between disconnect and disposal of a session, in milliseconds.
    /// Sessions may change their own value with `set_timeout`.
    pub default_dispose_timeout_ms: u64,
    /// Longest accepted command line, in bytes
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 11400,
            default_dispose_timeout_ms: 30_000,
            max_line_length: 4096,
        }
    }
}

impl ServerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_length == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_line_length cannot be 0".into(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn default_dispose_timeout(&self) -> Duration {
        Duration::from_millis(self.default_dispose_timeout_ms)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}
