//! Per-connection command loop.

use crate::domain::error::ServerError;
use crate::domain::session::SessionRegistry;
use crate::protocol::{Command, Reply};
use ql_01_lock_engine::LockCoordinationApi;
use quantum_telemetry::COMMANDS_PROCESSED;
use shared_types::{LockResponse, SessionId};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::{debug, info, info_span, warn, Instrument};

/// Serves connections against one engine and one session registry.
pub struct ConnectionHandler {
    engine: Arc<dyn LockCoordinationApi>,
    sessions: Arc<SessionRegistry>,
    max_line_length: usize,
}

impl ConnectionHandler {
    pub fn new(
        engine: Arc<dyn LockCoordinationApi>,
        sessions: Arc<SessionRegistry>,
        max_line_length: usize,
    ) -> Self {
        Self {
            engine,
            sessions,
            max_line_length,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Run one connection to completion.
    ///
    /// Lines are handled strictly one at a time: the next line is not read
    /// before the reply to the previous one has been written.
    pub async fn serve<S>(&self, stream: S, peer: SocketAddr) -> Result<(), ServerError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut session = self.sessions.open();
        let span = info_span!("session", id = session.get(), %peer);

        let result = self
            .command_loop(stream, &mut session)
            .instrument(span.clone())
            .await;

        self.sessions
            .disconnect(session)
            .instrument(span.clone())
            .await;
        span.in_scope(|| info!(session = %session, "Connection closed"));
        result
    }

    async fn command_loop<S>(&self, stream: S, session: &mut SessionId) -> Result<(), ServerError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        info!(session = %session, "Connected");
        let (read_half, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        let limit = self.max_line_length as u64 + 1;

        loop {
            line.clear();
            if (&mut reader).take(limit).read_line(&mut line).await? == 0 {
                return Ok(());
            }
            if !line.ends_with('\n') && line.len() > self.max_line_length {
                warn!(max = self.max_line_length, "Command line too long");
                writer.write_all(Reply::internal_error().encode().as_bytes()).await?;
                return Ok(());
            }

            let text = line.trim_end_matches('\n').trim_end_matches('\r');
            debug!(command = text, "Command received");

            let reply = match Command::parse(text) {
                Ok(command) => {
                    tokio::select! {
                        reply = self.execute(session, command) => reply,
                        _ = peer_closed(&mut reader) => {
                            debug!("Peer closed while command was pending");
                            return Ok(());
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Rejected command");
                    Reply::internal_error()
                }
            };

            writer.write_all(reply.encode().as_bytes()).await?;
            writer.flush().await?;
            if reply.close {
                return Ok(());
            }
        }
    }

    /// Apply one command on behalf of `session`.
    ///
    /// `conn_id <id>` may switch the connection to another session id.
    pub async fn execute(&self, session: &mut SessionId, command: Command) -> Reply {
        COMMANDS_PROCESSED
            .with_label_values(&[command.name()])
            .inc();

        match command {
            Command::Lock { key, timeout } => self
                .engine
                .acquire_exclusive(*session, key, timeout)
                .await
                .into(),
            Command::LockValue {
                key,
                value,
                timeout,
            } => self
                .engine
                .acquire_value(*session, key, value, timeout)
                .await
                .into(),
            Command::Unlock { key } => self.engine.release(*session, key).await.into(),
            Command::UnlockAll => self.unlock_all(*session).await,
            Command::Quit => self.unlock_all(*session).await.and_close(),
            Command::SetTimeout { dispose_after } => {
                self.sessions.set_dispose_timeout(*session, dispose_after);
                Reply::ok()
            }
            Command::ConnId => LockResponse::ok(session.get().to_string()).into(),
            Command::Resume { target } => match self.sessions.resume(*session, target).await {
                Ok(()) => {
                    if *session != target {
                        info!(from = %session, to = %target, "Session resumed");
                    }
                    *session = target;
                    LockResponse::ok("Resumed").into()
                }
                Err(err) => {
                    warn!(requested = %target, error = %err, "Resume refused");
                    LockResponse::new(err.code(), err.to_string()).into()
                }
            },
            Command::Stats => self.stats().await,
            Command::Debug => self.debug().await,
        }
    }

    async fn unlock_all(&self, session: SessionId) -> Reply {
        match self.engine.release_all(session).await {
            Ok(()) => Reply::ok(),
            Err(err) => LockResponse::from(err).into(),
        }
    }

    async fn stats(&self) -> Reply {
        let locks = match self.engine.count().await {
            Ok(locks) => locks,
            Err(err) => return LockResponse::from(err).into(),
        };
        let clients = self.sessions.count();
        Reply::lines(vec![
            LockResponse::ok("STATS").to_line(),
            format!("STAT clients {clients}"),
            format!("STAT locks {locks}"),
            format!("STAT monitoring {clients}"),
            "END".to_string(),
        ])
    }

    async fn debug(&self) -> Reply {
        match self.engine.describe().await {
            Ok(entries) => {
                let mut lines = Vec::with_capacity(entries.len() + 2);
                lines.push(LockResponse::ok("DEBUG").to_line());
                lines.extend(entries);
                lines.push("END".to_string());
                Reply::lines(lines)
            }
            Err(err) => LockResponse::from(err).into(),
        }
    }
}

/// Resolves once the peer has closed its side; never resolves while unread
/// input is pending.
async fn peer_closed<R: AsyncBufRead + Unpin>(reader: &mut R) {
    match reader.fill_buf().await {
        Ok(buffered) if !buffered.is_empty() => std::future::pending::<()>().await,
        _ => {}
    }
}
