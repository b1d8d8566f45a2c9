//! Command-line interface for procstream.
//!
//! `procstream serve` runs the HTTP/WebSocket server; `list`, `metrics` and
//! `search` query the process supervisor and log files directly.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary entry point
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use parser::{Cli, StreamArgs};
