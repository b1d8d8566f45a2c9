//! Stream identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of a process's two output streams is being tailed.
///
/// The wire names follow the supervisor's log path naming (`out` / `error`);
/// `stdout` / `stderr` are accepted as aliases on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    /// Standard output (`out` log file)
    #[default]
    #[serde(rename = "out", alias = "stdout")]
    Out,
    /// Standard error (`error` log file)
    #[serde(rename = "error", alias = "stderr", alias = "err")]
    Error,
}

impl StreamKind {
    /// Wire name of this stream kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "out" | "stdout" => Ok(Self::Out),
            "error" | "err" | "stderr" => Ok(Self::Error),
            other => Err(format!("unknown stream kind '{other}' (expected out or error)")),
        }
    }
}

/// Identity of one tailable log stream.
///
/// Used as the watch registry's map key: at most one tailer exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamKey {
    /// Name of the supervised process
    pub process_name: String,
    /// Which output stream
    pub stream_kind: StreamKind,
}

impl StreamKey {
    /// Create a new stream key.
    pub fn new(process_name: impl Into<String>, stream_kind: StreamKind) -> Self {
        Self {
            process_name: process_name.into(),
            stream_kind,
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.process_name, self.stream_kind)
    }
}

/// Opaque identifier of one observer connection.
///
/// Adapters choose the representation (the axum adapter uses UUIDs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Wrap an adapter-provided identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
