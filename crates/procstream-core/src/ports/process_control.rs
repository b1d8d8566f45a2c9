//! Process-control collaborator port.
//!
//! The supervisor owns process lifecycle, resource accounting and log file
//! paths. procstream only reads from it (listing, describing) and forwards
//! lifecycle commands. Implementations must serialize their own access to the
//! supervisor; callers treat them as stateless request/response.

use async_trait::async_trait;
use thiserror::Error;

use super::StreamError;
use crate::domain::ProcessInfo;

/// Errors reported by a process-control implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessControlError {
    /// No process with this name.
    #[error("Process {0} not found")]
    ProcessNotFound(String),

    /// The supervisor could not be reached or returned garbage.
    #[error("Process supervisor unavailable: {0}")]
    SupervisorUnavailable(String),
}

impl From<ProcessControlError> for StreamError {
    fn from(err: ProcessControlError) -> Self {
        match err {
            ProcessControlError::ProcessNotFound(name) => Self::ProcessNotFound(name),
            ProcessControlError::SupervisorUnavailable(msg) => Self::SupervisorUnavailable(msg),
        }
    }
}

/// Port for querying and driving the process supervisor.
#[async_trait]
pub trait ProcessControlPort: Send + Sync {
    /// List every supervised process.
    async fn list_processes(&self) -> Result<Vec<ProcessInfo>, ProcessControlError>;

    /// Describe a single process by name.
    async fn describe_process(&self, name: &str) -> Result<ProcessInfo, ProcessControlError>;

    /// Start a stopped process.
    async fn start_process(&self, name: &str) -> Result<(), ProcessControlError>;

    /// Stop a running process.
    async fn stop_process(&self, name: &str) -> Result<(), ProcessControlError>;

    /// Restart a process.
    async fn restart_process(&self, name: &str) -> Result<(), ProcessControlError>;
}
