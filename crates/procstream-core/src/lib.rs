//! Core domain types and port definitions for procstream.
//!
//! This crate is transport- and runtime-agnostic. It defines:
//!
//! - `domain` - stream identities, process descriptions, metrics snapshots
//! - `events` - the inbound/outbound connection protocol
//! - `ports` - the process-control collaborator trait and the error taxonomy
//! - `settings` - tunables for tailing, search and fan-out
//!
//! Runtime behaviour (tailing, fan-out, search) lives in `procstream-runtime`;
//! transports live in adapter crates such as `procstream-axum`.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    ConnectionId, LogLine, LogPaths, MetricsSnapshot, ProcessInfo, ProcessMetric, ProcessStatus,
    StreamKey, StreamKind,
};
pub use events::{ClientRequest, ServerEvent};
pub use ports::{ProcessControlError, ProcessControlPort, StreamError, StreamResult};
pub use settings::{
    DEFAULT_INITIAL_LINES, DEFAULT_OUTBOUND_BUFFER, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SEARCH_MAX_RESULTS, RotationPolicy, SettingsError, StreamSettings,
};
