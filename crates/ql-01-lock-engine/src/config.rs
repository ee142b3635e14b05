//! Configuration for the lock engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the lock service command channel
    pub command_buffer: usize,
    /// Longest wait a single request may ask for (seconds)
    pub max_timeout_secs: u64,
}

impl EngineConfig {
    pub fn max_timeout(&self) -> Duration {
        Duration::from_secs(self.max_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_buffer: 1024,
            max_timeout_secs: 86_400,
        }
    }
}
