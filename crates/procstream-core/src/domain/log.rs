use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StreamKey, StreamKind};

/// A single live log line, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    /// Process the line belongs to
    pub process_name: String,
    /// Stream the line was read from
    pub stream_kind: StreamKind,
    /// The line content, without trailing newline
    pub message: String,
    /// When the line was observed
    pub timestamp: DateTime<Utc>,
}

impl LogLine {
    /// Create a log line stamped with the current time.
    pub fn now(key: &StreamKey, message: String) -> Self {
        Self {
            process_name: key.process_name.clone(),
            stream_kind: key.stream_kind,
            message,
            timestamp: Utc::now(),
        }
    }
}
