//! Process descriptions reported by the supervisor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::StreamKind;

/// Supervisor-reported lifecycle status.
///
/// Statuses the supervisor reports that procstream does not model
/// (e.g. "waiting restart") deserialize to `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    /// Running normally
    Online,
    /// Starting up
    Launching,
    /// Stop in progress
    Stopping,
    /// Stopped cleanly
    Stopped,
    /// Crashed or failed to start
    Errored,
    /// Anything else
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProcessStatus {
    /// Wire name of this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Launching => "launching",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Errored => "errored",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a supervisor status string, mapping unrecognised values to `Unknown`.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "online" => Self::Online,
            "launching" => Self::Launching,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            "errored" => Self::Errored,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log file locations of one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPaths {
    /// stdout log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,
    /// stderr log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PathBuf>,
}

impl LogPaths {
    /// Build from raw supervisor strings; empty strings mean "not configured".
    pub fn from_raw(out: &str, error: &str) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| PathBuf::from(s));
        Self {
            out: non_empty(out),
            error: non_empty(error),
        }
    }

    /// Path for the given stream kind, if configured.
    pub fn get(&self, kind: StreamKind) -> Option<&Path> {
        match kind {
            StreamKind::Out => self.out.as_deref(),
            StreamKind::Error => self.error.as_deref(),
        }
    }
}

/// A supervised process as described by the process-control collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    /// Process name (identifier used in every request)
    pub name: String,
    /// Supervisor id, when the supervisor has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_id: Option<u32>,
    /// Lifecycle status
    pub status: ProcessStatus,
    /// CPU usage in percent
    pub cpu: f64,
    /// Resident memory in bytes
    pub memory: u64,
    /// Uptime reference reported by the supervisor (milliseconds)
    pub uptime: u64,
    /// Number of restarts
    pub restarts: u32,
    /// Log file locations
    pub log_paths: LogPaths,
    /// OS process id while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Listening port, when discoverable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Execution mode (fork / cluster)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_mode: Option<String>,
    /// Configured instance count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    /// Application version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ProcessInfo {
    /// Minimal description, mostly useful for tests and fakes.
    pub fn new(name: impl Into<String>, status: ProcessStatus) -> Self {
        Self {
            name: name.into(),
            status,
            ..Self::default()
        }
    }

    /// Set resource usage.
    #[must_use]
    pub const fn with_usage(mut self, cpu: f64, memory: u64) -> Self {
        self.cpu = cpu;
        self.memory = memory;
        self
    }

    /// Set the log file locations.
    #[must_use]
    pub fn with_log_paths(mut self, out: impl Into<PathBuf>, error: impl Into<PathBuf>) -> Self {
        self.log_paths = LogPaths {
            out: Some(out.into()),
            error: Some(error.into()),
        };
        self
    }

    /// Log path for the given stream, if the supervisor reported one.
    pub fn log_path(&self, kind: StreamKind) -> Option<&Path> {
        self.log_paths.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_paths_are_unconfigured() {
        let paths = LogPaths::from_raw("/var/log/api-out.log", "  ");
        assert_eq!(
            paths.get(StreamKind::Out),
            Some(Path::new("/var/log/api-out.log"))
        );
        assert_eq!(paths.get(StreamKind::Error), None);
    }

    #[test]
    fn unknown_status_deserializes() {
        let status: ProcessStatus = serde_json::from_str("\"waiting restart\"").unwrap();
        assert_eq!(status, ProcessStatus::Unknown);
        assert_eq!(ProcessStatus::parse_lossy("errored"), ProcessStatus::Errored);
    }
}
