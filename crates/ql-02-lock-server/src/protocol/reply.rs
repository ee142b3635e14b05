//! Reply framing.

use shared_types::{LockResponse, ResponseCode};

/// Lines to write back for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    /// Close the connection once the lines are written.
    pub close: bool,
}

impl Reply {
    pub fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            close: false,
        }
    }

    pub fn ok() -> Self {
        LockResponse::status(ResponseCode::Ok).into()
    }

    pub fn internal_error() -> Self {
        LockResponse::status(ResponseCode::InternalError).into()
    }

    pub fn and_close(mut self) -> Self {
        self.close = true;
        self
    }

    /// Wire bytes: every line terminated by `\n`.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl From<LockResponse> for Reply {
    fn from(response: LockResponse) -> Self {
        Self::lines(vec![response.to_line()])
    }
}
