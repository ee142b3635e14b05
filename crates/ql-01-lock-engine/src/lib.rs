//! # QL-01: Lock Engine
//!
//! In-memory lock table for the lock coordination service: exclusive and
//! value-consensus locks, FIFO wait queues, per-request timeouts and
//! deadlock detection over the wait-for graph.
//!
//! ## Architecture
//!
//! - **Domain**: `Lock`, `PendingWait`, kind policies, value objects, invariants
//! - **Algorithms**: BFS deadlock detection
//! - **Ports**: Inbound (`LockCoordinationApi`) and Outbound (`TimeoutScheduler`)
//! - **Adapters**: tokio-backed timeout scheduler
//! - **Application**: `LockCoordinator` and the single-task `LockService`
//!
//! ## Example
//!
//! ```no_run
//! use ql_01_lock_engine::{EngineConfig, LockCoordinationApi, LockService};
//! use shared_types::SessionId;
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let (locks, _task) = LockService::spawn(EngineConfig::default());
//! let session = SessionId::new(1);
//! let response = locks
//!     .acquire_exclusive(session, "jobs".into(), Duration::from_secs(5))
//!     .await;
//! assert!(response.is_ok());
//! # }
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::TokioTimeoutScheduler;
pub use application::coordinator::{Acquisition, LockCoordinator, LOCK_ACQUIRED, LOCK_RELEASED};
pub use application::service::{LockService, LockServiceHandle, ServiceCommand};
pub use config::EngineConfig;
pub use domain::entities::*;
pub use domain::errors::LockError;
pub use domain::policy::LockPolicy;
pub use domain::value_objects::*;
pub use ports::inbound::LockCoordinationApi;
pub use ports::outbound::TimeoutScheduler;
