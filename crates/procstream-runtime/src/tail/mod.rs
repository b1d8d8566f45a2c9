//! File tailing.
//!
//! A [`Tailer`] owns one read cursor on one log file and turns appended bytes
//! into complete lines. [`read_backlog`] reconstructs the most recent lines of
//! a file from disk for a joining subscriber.

mod backlog;
mod gauge;
mod lines;
mod tailer;

pub use backlog::read_backlog;
pub use gauge::TailerGauge;
pub use tailer::{FileIdentity, Polled, TailEvent, TailOptions, Tailer};

pub(crate) use lines::decode_line;

/// Upper bound on bytes read from a file in one step.
pub const READ_CHUNK: usize = 64 * 1024;

/// Longest line kept whole; longer lines are cut at this many bytes.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;
