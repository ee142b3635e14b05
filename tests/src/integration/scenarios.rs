//! # Lock Scenarios Over The Wire

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::harness::{send, TestServer};
    use ql_01_lock_engine::LockCoordinationApi;
    use shared_types::SessionId;

    fn id(raw: u64) -> SessionId {
        SessionId::new(raw)
    }

    #[tokio::test]
    async fn test_waiter_granted_after_release() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "lock A 5").await, "200 Lock acquired");

        let waiter = tokio::spawn(async move {
            let status = send(&mut second, "lock A 5").await;
            (status, second)
        });
        assert!(server.wait_queued("A", &[id(2)]).await);

        assert_eq!(send(&mut first, "unlock A").await, "200 Lock released");
        let (status, _second) = waiter.await.unwrap();
        assert_eq!(status, "200 Lock acquired");

        let snapshot = server.snapshot("A").await.unwrap();
        assert_eq!(snapshot.owners, vec![id(2)]);
        assert!(snapshot.queued.is_empty());
        server.stop().await;
    }

    #[tokio::test]
    async fn test_waiter_times_out_with_conflict() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "lock A 1").await, "200 Lock acquired");

        let started = Instant::now();
        assert_eq!(send(&mut second, "lock A 1").await, "409 Already locked by #1");
        assert!(started.elapsed() >= Duration::from_millis(900));

        let snapshot = server.snapshot("A").await.unwrap();
        assert_eq!(snapshot.owners, vec![id(1)]);
        assert!(snapshot.queued.is_empty());
        server.stop().await;
    }

    #[tokio::test]
    async fn test_value_lock_consensus_and_handover() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;
        let mut third = server.client().await;

        assert_eq!(send(&mut first, "lock_value B x").await, "200 Lock acquired");
        assert_eq!(send(&mut second, "lock_value B x 5").await, "200 Lock acquired");

        let waiter = tokio::spawn(async move {
            let status = send(&mut third, "lock_value B y 5").await;
            (status, third)
        });
        assert!(server.wait_queued("B", &[id(3)]).await);

        assert_eq!(send(&mut first, "unlock B").await, "200 Lock released");
        assert!(!waiter.is_finished());
        assert_eq!(send(&mut second, "unlock B").await, "200 Lock released");

        let (status, _third) = waiter.await.unwrap();
        assert_eq!(status, "200 Lock acquired");

        let snapshot = server.snapshot("B").await.unwrap();
        assert_eq!(snapshot.owners, vec![id(3)]);
        assert_eq!(snapshot.value.map(|v| v.to_string()), Some("y".to_string()));
        server.stop().await;
    }

    #[tokio::test]
    async fn test_wrong_kind_is_internal_error() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "lock A").await, "200 Lock acquired");
        for line in ["lock_value A v", "lock_value A v 5"] {
            let status = send(&mut second, line).await;
            assert!(status.starts_with("500 "), "{line}: {status}");
        }

        let snapshot = server.snapshot("A").await.unwrap();
        assert_eq!(snapshot.owners, vec![id(1)]);
        assert!(snapshot.queued.is_empty());
        server.stop().await;
    }

    #[tokio::test]
    async fn test_deadlock_reported_to_closing_requester() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "lock A").await, "200 Lock acquired");
        assert_eq!(send(&mut second, "lock B").await, "200 Lock acquired");

        let blocked = tokio::spawn(async move {
            let status = send(&mut first, "lock B 5").await;
            (status, first)
        });
        assert!(server.wait_queued("B", &[id(1)]).await);

        assert_eq!(
            send(&mut second, "lock A 5").await,
            "423 Deadlock: #2 => A = #1 => B = #2"
        );

        // Breaking the cycle lets the other side through.
        assert_eq!(send(&mut second, "unlock B").await, "200 Lock released");
        let (status, _first) = blocked.await.unwrap();
        assert_eq!(status, "200 Lock acquired");
        server.stop().await;
    }

    #[tokio::test]
    async fn test_unlock_by_non_owner_forbidden() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "lock A").await, "200 Lock acquired");
        assert_eq!(send(&mut second, "unlock A").await, "403 Locked by #1");
        assert_eq!(send(&mut second, "unlock missing").await, "200 Lock released");
        server.stop().await;
    }

    #[tokio::test]
    async fn test_zero_timeout_conflicts_immediately() {
        let server = TestServer::start().await;
        let mut first = server.client().await;
        let mut second = server.client().await;

        assert_eq!(send(&mut first, "lock A").await, "200 Lock acquired");
        assert_eq!(send(&mut second, "lock A").await, "409 Already locked by #1");
        assert_eq!(send(&mut second, "lock A x").await, "500 Internal server error");
        server.stop().await;
    }

    #[tokio::test]
    async fn test_unlock_all_releases_everything() {
        let server = TestServer::start().await;
        let mut first = server.client().await;

        for line in ["lock A", "lock B", "lock_value C v"] {
            assert_eq!(send(&mut first, line).await, "200 Lock acquired");
        }
        assert_eq!(server.engine.count().await.unwrap(), 3);
        assert_eq!(send(&mut first, "unlock_all").await, "200 OK");
        assert_eq!(server.engine.count().await.unwrap(), 0);
        server.stop().await;
    }
}
