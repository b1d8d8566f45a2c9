//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the streaming engine expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No supervisor-specific types (PM2 JSON, CLI output) in any signature
//! - The process-control collaborator is stateless request/response
//! - Every failure the engine can report is a `StreamError` variant

pub mod process_control;

use std::io;
use std::path::Path;
use thiserror::Error;

use crate::domain::StreamKind;

pub use process_control::{ProcessControlError, ProcessControlPort};

/// Errors surfaced by the streaming engine.
///
/// Request-scoped failures are reported back to the originating connection;
/// none of them is fatal to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The supervisor does not know the process.
    #[error("Process {0} not found")]
    ProcessNotFound(String),

    /// The process exists but has no log file for the requested stream.
    #[error("Log path not found for process {process} ({stream})")]
    LogPathUnavailable { process: String, stream: StreamKind },

    /// The log file does not exist.
    #[error("Log file not found: {0}")]
    FileNotFound(String),

    /// The log file exists but cannot be read.
    #[error("Permission denied reading {0}")]
    PermissionDenied(String),

    /// The supervisor could not be reached.
    #[error("Process supervisor unavailable: {0}")]
    SupervisorUnavailable(String),

    /// Reading an already-open log file failed.
    #[error("Log tailing failed: {0}")]
    TailerIo(String),

    /// The connection was never registered or has already closed.
    #[error("Connection {0} is not registered")]
    UnknownConnection(String),

    /// The connection's outbound queue has no room for a subscription's
    /// opening events.
    #[error("Outbound queue of connection {0} is full")]
    QueueFull(String),
}

impl StreamError {
    /// Classify an I/O error raised while opening or reading `path`.
    pub fn from_io(err: &io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.display().to_string()),
            _ => Self::TailerIo(format!("{}: {err}", path.display())),
        }
    }
}

/// Result alias for streaming engine operations.
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_io_errors() {
        let path = Path::new("/var/log/app.log");
        assert_eq!(
            StreamError::from_io(&io::Error::from(io::ErrorKind::NotFound), path),
            StreamError::FileNotFound("/var/log/app.log".to_string())
        );
        assert_eq!(
            StreamError::from_io(&io::Error::from(io::ErrorKind::PermissionDenied), path),
            StreamError::PermissionDenied("/var/log/app.log".to_string())
        );
        assert!(matches!(
            StreamError::from_io(&io::Error::other("disk on fire"), path),
            StreamError::TailerIo(_)
        ));
    }

    #[test]
    fn log_path_message_names_stream() {
        let err = StreamError::LogPathUnavailable {
            process: "api".to_string(),
            stream: StreamKind::Error,
        };
        assert_eq!(err.to_string(), "Log path not found for process api (error)");
    }
}
