//! Test server: the full lock runtime on an ephemeral port.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use lock_runtime::{LockRuntime, RuntimeConfig};
use ql_01_lock_engine::{LockKey, LockServiceHandle, LockSnapshot};
use ql_02_lock_server::{ServerConfig, SessionRegistry};
use ql_admin::AdminClient;
use shared_types::SessionId;

/// Bound on every reply the harness waits for.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestServer {
    pub addr: SocketAddr,
    pub engine: LockServiceHandle,
    runtime: LockRuntime,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(mut server: ServerConfig) -> Self {
        server.bind_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
        server.port = 0;
        let config = RuntimeConfig {
            server,
            ..RuntimeConfig::default()
        };

        let runtime = LockRuntime::start(config)
            .await
            .expect("start lock runtime");
        Self {
            addr: runtime.local_addr(),
            engine: runtime.engine().clone(),
            runtime,
        }
    }

    pub async fn client(&self) -> AdminClient {
        AdminClient::connect(self.addr, REPLY_TIMEOUT)
            .await
            .expect("connect to test server")
    }

    pub fn sessions(&self) -> Arc<SessionRegistry> {
        self.runtime.sessions()
    }

    pub async fn snapshot(&self, key: &str) -> Option<LockSnapshot> {
        self.engine
            .inspect(LockKey::from(key))
            .await
            .expect("engine running")
    }

    /// Wait until exactly `expected` are queued on `key`, in order.
    pub async fn wait_queued(&self, key: &str, expected: &[SessionId]) -> bool {
        for _ in 0..200 {
            if self
                .snapshot(key)
                .await
                .is_some_and(|snapshot| snapshot.queued == expected)
            {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    pub async fn stop(self) {
        self.runtime.shutdown().await;
    }
}

/// Send one line and return the status line as `"<code> <message>"`.
pub async fn send(client: &mut AdminClient, line: &str) -> String {
    let reply = client.send(line).await.expect("reply");
    format!("{} {}", reply.status.code, reply.status.message)
}

/// Poll `check` every 10ms until it holds, for at most two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
