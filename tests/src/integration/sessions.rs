//! # Session Identity Over The Wire
//!
//! Disconnect keeps a session's locks alive for its dispose delay; another
//! connection may take the session over with `conn_id <id>` in that window.

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, send, TestServer};
    use ql_01_lock_engine::LockCoordinationApi;
    use shared_types::SessionId;

    fn id(raw: u64) -> SessionId {
        SessionId::new(raw)
    }

    #[tokio::test]
    async fn test_conn_id_reports_session() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "conn_id").await, "200 1");
        assert_eq!(send(&mut second, "conn_id").await, "200 2");
        server.stop().await;
    }

    #[tokio::test]
    async fn test_resume_after_disconnect_keeps_locks() {
        let server = TestServer::start().await;
        let sessions = server.sessions();

        let mut first = server.client().await;
        assert_eq!(send(&mut first, "set_timeout 5000").await, "200 OK");
        assert_eq!(send(&mut first, "lock A").await, "200 Lock acquired");
        drop(first);
        assert!(eventually(|| !sessions.is_connected(id(1))).await);
        assert!(sessions.contains(id(1)));

        let mut second = server.client().await;
        assert_eq!(send(&mut second, "conn_id 1").await, "200 Resumed");
        assert_eq!(send(&mut second, "conn_id").await, "200 1");
        assert!(sessions.is_connected(id(1)));
        assert_eq!(send(&mut second, "unlock A").await, "200 Lock released");
        server.stop().await;
    }

    #[tokio::test]
    async fn test_resume_refused_while_target_connected() {
        let server = TestServer::start().await;
        let _first = server.client().await;
        let mut second = server.client().await;
        assert!(eventually(|| server.sessions().is_connected(id(1))).await);

        assert_eq!(
            send(&mut second, "conn_id 1").await,
            "403 Can not resume connection - it is still active"
        );
        server.stop().await;
    }

    #[tokio::test]
    async fn test_resume_refused_when_current_holds_locks() {
        let server = TestServer::start().await;
        let sessions = server.sessions();

        let mut first = server.client().await;
        assert_eq!(send(&mut first, "set_timeout 5000").await, "200 OK");
        drop(first);
        assert!(eventually(|| !sessions.is_connected(id(1))).await);

        let mut second = server.client().await;
        assert_eq!(send(&mut second, "lock B").await, "200 Lock acquired");
        assert_eq!(
            send(&mut second, "conn_id 1").await,
            "403 Can not resume connection - current connection already acquired locks"
        );
        server.stop().await;
    }

    #[tokio::test]
    async fn test_disposed_session_releases_locks() {
        let server = TestServer::start().await;
        let sessions = server.sessions();

        let mut first = server.client().await;
        assert_eq!(send(&mut first, "set_timeout 0").await, "200 OK");
        assert_eq!(send(&mut first, "lock A").await, "200 Lock acquired");
        drop(first);

        let mut second = server.client().await;
        assert_eq!(send(&mut second, "lock A 5").await, "200 Lock acquired");
        assert!(eventually(|| !sessions.contains(id(1))).await);
        assert_eq!(send(&mut second, "unlock A").await, "200 Lock released");
        assert_eq!(
            send(&mut second, "conn_id 1").await,
            "403 Can not resume connection - it is already disposed"
        );
        server.stop().await;
    }

    #[tokio::test]
    async fn test_quit_releases_and_closes() {
        let server = TestServer::start().await;
        let mut first = server.client().await;

        assert_eq!(send(&mut first, "lock A").await, "200 Lock acquired");
        assert_eq!(send(&mut first, "quit").await, "200 OK");
        assert!(first.send("conn_id").await.is_err());
        assert_eq!(server.engine.count().await.unwrap(), 0);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_stats_and_debug() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "lock_value cfg v1").await, "200 Lock acquired");
        assert!(eventually(|| server.sessions().count() == 2).await);

        let stats = second.stats().await.unwrap();
        assert_eq!(stats.clients, 2);
        assert_eq!(stats.locks, 1);
        assert_eq!(stats.monitoring, 2);

        assert_eq!(second.debug().await.unwrap(), vec!["LOCK cfg #1 (v1)".to_string()]);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_commands_keep_connection() {
        let server = TestServer::start().await;
        let mut client = server.client().await;

        for line in ["", "lock", "frobnicate a", "set_timeout soon", "conn_id 0", "conn_id -1"] {
            assert_eq!(send(&mut client, line).await, "500 Internal server error", "{line:?}");
        }
        assert_eq!(send(&mut client, "conn_id").await, "200 1");
        server.stop().await;
    }
}
