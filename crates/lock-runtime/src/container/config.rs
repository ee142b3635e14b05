//! # Runtime Configuration
//!
//! Defaults for the engine, the server and telemetry, overridden by
//! environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QL_BIND_ADDRESS` | `server.bind_address` |
//! | `QL_PORT` | `server.port` |
//! | `QL_DISPOSE_TIMEOUT_MS` | `server.default_dispose_timeout_ms` |
//! | `QL_MAX_LINE_LENGTH` | `server.max_line_length` |
//! | `QL_MAX_TIMEOUT_SECS` | `engine.max_timeout_secs` |
//! | `QL_COMMAND_BUFFER` | `engine.command_buffer` |
//!
//! Logging variables (`QL_LOG_LEVEL`, `QL_JSON_LOGS`, ...) are read by
//! `TelemetryConfig::from_env`.

use ql_01_lock_engine::EngineConfig;
use ql_02_lock_server::ServerConfig;
use quantum_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Protocol server configuration.
    pub server: ServerConfig,
    /// Lock engine configuration.
    pub engine: EngineConfig,
    /// Logging and metrics configuration.
    pub telemetry: TelemetryConfig,
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        let mut config = Self {
            telemetry: TelemetryConfig::from_env(),
            ..Self::default()
        };
        config.apply_overrides(|name| env::var(name).ok());
        config
    }

    /// Apply overrides from `lookup`. Unparsable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = parse_override(&lookup, "QL_BIND_ADDRESS") {
            self.server.bind_address = address;
        }
        if let Some(port) = parse_override(&lookup, "QL_PORT") {
            self.server.port = port;
        }
        if let Some(millis) = parse_override(&lookup, "QL_DISPOSE_TIMEOUT_MS") {
            self.server.default_dispose_timeout_ms = millis;
        }
        if let Some(length) = parse_override(&lookup, "QL_MAX_LINE_LENGTH") {
            self.server.max_line_length = length;
        }
        if let Some(secs) = parse_override(&lookup, "QL_MAX_TIMEOUT_SECS") {
            self.engine.max_timeout_secs = secs;
        }
        if let Some(buffer) = parse_override(&lookup, "QL_COMMAND_BUFFER") {
            self.engine.command_buffer = buffer;
        }
    }

    /// Validate configuration before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.command_buffer == 0 {
            return Err(ConfigError::ZeroCommandBuffer);
        }
        self.server.validate()?;
        Ok(())
    }
}

fn parse_override<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring invalid configuration override");
            None
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The engine needs room for at least one queued command.
    #[error("engine command buffer cannot be 0")]
    ZeroCommandBuffer,

    #[error(transparent)]
    Server(#[from] ql_02_lock_server::ConfigError),
}
