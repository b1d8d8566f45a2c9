//! Domain types shared by every procstream crate.
//!
//! These are pure value types with no I/O. They describe what is being
//! streamed (`StreamKey`), who it is streamed to (`ConnectionId`), and what
//! the process supervisor reports (`ProcessInfo`, `MetricsSnapshot`).

mod log;
mod metrics;
mod process;
mod stream;

pub use log::LogLine;
pub use metrics::{MetricsSnapshot, ProcessMetric};
pub use process::{LogPaths, ProcessInfo, ProcessStatus};
pub use stream::{ConnectionId, StreamKey, StreamKind};
