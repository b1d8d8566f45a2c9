//! Streaming engine for procstream.
//!
//! Turns growing log files and connected observers into correctly fanned-out,
//! cancelable streams:
//!
//! - [`tail`] - one read cursor per file, rotation handling, backlog reads
//! - [`watch`] - reference-counted registry of active tailers
//! - [`subscription`] - per-connection Idle/Watching state machine
//! - [`search`] - bounded literal search
//! - [`metrics`] - fleet snapshots from the process supervisor
//! - [`gateway`] - transport-agnostic request dispatch
//! - [`pm2`] - process-control adapter for the PM2 CLI

#![deny(unsafe_code)]

pub mod gateway;
pub mod metrics;
pub mod pm2;
pub mod search;
pub mod sink;
pub mod subscription;
pub mod tail;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod watch;

pub use gateway::StreamGateway;
pub use metrics::MetricsSampler;
pub use pm2::Pm2Supervisor;
pub use search::{SearchExecutor, SearchOutcome};
pub use sink::ConnectionSink;
pub use subscription::SubscriptionManager;
pub use tail::{TailEvent, TailOptions, Tailer, TailerGauge, read_backlog};
pub use watch::WatchRegistry;
