//! Parsed server replies.

use serde::Serialize;

/// Status lines that open a multi-line block closed by `END`.
const BLOCK_HEADERS: [&str; 2] = ["STATS", "DEBUG"];

/// Terminator of a multi-line block.
pub const BLOCK_END: &str = "END";

/// First line of every reply: `<code> <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub code: u16,
    pub message: String,
}

impl StatusLine {
    /// Parse `"200 OK"`. `None` when the line has no numeric code.
    pub fn parse(line: &str) -> Option<Self> {
        let (code, message) = line.split_once(' ').unwrap_or((line, ""));
        Some(Self {
            code: code.parse().ok()?,
            message: message.to_string(),
        })
    }

    pub fn is_ok(&self) -> bool {
        self.code == 200
    }

    /// Whether more lines follow, up to `END`.
    pub fn opens_block(&self) -> bool {
        self.is_ok() && BLOCK_HEADERS.contains(&self.message.as_str())
    }
}

/// One complete reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub status: StatusLine,
    /// Block body without the `END` terminator.
    pub body: Vec<String>,
}

/// Counters from the `stats` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    pub clients: u64,
    pub locks: u64,
    pub monitoring: u64,
}

impl ServerStats {
    /// Read `STAT <name> <value>` lines. Unknown names are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut stats = Self::default();
        for line in lines {
            let mut parts = line.split(' ');
            if parts.next() != Some("STAT") {
                continue;
            }
            let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let Ok(value) = value.parse() else {
                continue;
            };
            match name {
                "clients" => stats.clients = value,
                "locks" => stats.locks = value,
                "monitoring" => stats.monitoring = value,
                _ => {}
            }
        }
        stats
    }
}
