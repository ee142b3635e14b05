//! TCP client for the lock server.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::types::*;

/// Errors that can occur when talking to the lock server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server closed the connection")]
    Closed,
    #[error("Timed out waiting for the server")]
    Timeout,
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// One admin connection. Commands are sent in order on the same session.
pub struct AdminClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    reply_timeout: Duration,
}

impl AdminClient {
    /// Connect to `addr`. A lock command may legitimately wait, so
    /// `reply_timeout` bounds each reply rather than the connection.
    pub async fn connect(addr: SocketAddr, reply_timeout: Duration) -> Result<Self, ApiError> {
        let stream = timeout(Duration::from_secs(2), TcpStream::connect(addr))
            .await
            .map_err(|_| ApiError::Connection(format!("Timed out connecting to {addr}")))?
            .map_err(|e| ApiError::Connection(format!("Cannot connect to {addr}: {e}")))?;
        let (read, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read),
            writer,
            reply_timeout,
        })
    }

    /// Send one raw command line and read its full reply.
    pub async fn send(&mut self, line: &str) -> Result<Reply, ApiError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        timeout(self.reply_timeout, self.read_reply())
            .await
            .map_err(|_| ApiError::Timeout)?
    }

    /// `stats`, parsed.
    pub async fn stats(&mut self) -> Result<ServerStats, ApiError> {
        let reply = self.expect_block("stats").await?;
        Ok(ServerStats::from_lines(reply.body.iter().map(String::as_str)))
    }

    /// `debug`: one line per lock.
    pub async fn debug(&mut self) -> Result<Vec<String>, ApiError> {
        Ok(self.expect_block("debug").await?.body)
    }

    async fn expect_block(&mut self, command: &str) -> Result<Reply, ApiError> {
        let reply = self.send(command).await?;
        if !reply.status.opens_block() {
            return Err(ApiError::Parse(format!(
                "unexpected reply to {command}: {} {}",
                reply.status.code, reply.status.message
            )));
        }
        Ok(reply)
    }

    async fn read_reply(&mut self) -> Result<Reply, ApiError> {
        let first = self.read_line().await?;
        let status = StatusLine::parse(&first)
            .ok_or_else(|| ApiError::Parse(format!("bad status line: {first}")))?;

        let mut body = Vec::new();
        if status.opens_block() {
            loop {
                let line = self.read_line().await?;
                if line == BLOCK_END {
                    break;
                }
                body.push(line);
            }
        }
        Ok(Reply { status, body })
    }

    async fn read_line(&mut self) -> Result<String, ApiError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(ApiError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
