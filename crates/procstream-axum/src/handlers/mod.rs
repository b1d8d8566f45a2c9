//! HTTP and WebSocket handlers.
//!
//! Handlers are thin: the streaming gateway owns connection semantics and
//! the process-control port owns lifecycle commands.

pub mod metrics;
pub mod processes;
pub mod ws;
