//! Protocol commands.
//!
//! A line is split on single spaces; the first word names the command and
//! the number of remaining words selects the variant, so `lock a` and
//! `lock a 5` are the same command while `lock` alone is unknown.

use crate::domain::error::CommandError;
use ql_01_lock_engine::{LockKey, LockValue};
use shared_types::SessionId;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `lock <key> [timeout]`
    Lock { key: LockKey, timeout: Duration },
    /// `lock_value <key> <value> [timeout]`
    LockValue {
        key: LockKey,
        value: LockValue,
        timeout: Duration,
    },
    /// `unlock <key>`
    Unlock { key: LockKey },
    /// `unlock_all`
    UnlockAll,
    /// `quit`
    Quit,
    /// `set_timeout <ms>`
    SetTimeout { dispose_after: Duration },
    /// `conn_id`
    ConnId,
    /// `conn_id <id>`
    Resume { target: SessionId },
    /// `stats`
    Stats,
    /// `debug`
    Debug,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split(' ');
        let name = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let command = match (name, args.as_slice()) {
            ("lock", [key]) => Command::Lock {
                key: LockKey::new(*key),
                timeout: Duration::ZERO,
            },
            ("lock", [key, timeout]) => Command::Lock {
                key: LockKey::new(*key),
                timeout: parse_wait(timeout)?,
            },
            ("lock_value", [key, value]) => Command::LockValue {
                key: LockKey::new(*key),
                value: LockValue::new(*value),
                timeout: Duration::ZERO,
            },
            ("lock_value", [key, value, timeout]) => Command::LockValue {
                key: LockKey::new(*key),
                value: LockValue::new(*value),
                timeout: parse_wait(timeout)?,
            },
            ("unlock", [key]) => Command::Unlock {
                key: LockKey::new(*key),
            },
            ("unlock_all", []) => Command::UnlockAll,
            ("quit", []) => Command::Quit,
            ("set_timeout", [millis]) => Command::SetTimeout {
                dispose_after: Duration::from_millis(parse_number(millis)?),
            },
            ("conn_id", []) => Command::ConnId,
            ("conn_id", [id]) => Command::Resume {
                target: id.parse()?,
            },
            ("stats", []) => Command::Stats,
            ("debug", []) => Command::Debug,
            _ => {
                return Err(CommandError::Unknown {
                    name: name.to_string(),
                    argc: args.len(),
                })
            }
        };
        Ok(command)
    }

    /// Stable name, used as a metric label.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Lock { .. } => "lock",
            Command::LockValue { .. } => "lock_value",
            Command::Unlock { .. } => "unlock",
            Command::UnlockAll => "unlock_all",
            Command::Quit => "quit",
            Command::SetTimeout { .. } => "set_timeout",
            Command::ConnId | Command::Resume { .. } => "conn_id",
            Command::Stats => "stats",
            Command::Debug => "debug",
        }
    }
}

/// Lock wait in whole seconds; an empty argument means no wait.
fn parse_wait(text: &str) -> Result<Duration, CommandError> {
    if text.is_empty() {
        return Ok(Duration::ZERO);
    }
    parse_number(text).map(Duration::from_secs)
}

fn parse_number(text: &str) -> Result<u64, CommandError> {
    text.parse()
        .map_err(|_| CommandError::InvalidNumber(text.to_string()))
}
