//! Connection protocol: inbound requests and outbound events.
//!
//! This module is the single source of truth for the messages exchanged with
//! observer connections, whatever the transport.
//!
//! # Wire Format
//!
//! Messages are JSON objects tagged by `type`, with camelCase field names:
//!
//! ```json
//! { "type": "subscribe", "processName": "api", "streamKind": "out" }
//! { "type": "line", "processName": "api", "streamKind": "out", "message": "GET /", "timestamp": "2024-05-01T10:00:00Z" }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{LogLine, MetricsSnapshot, StreamKey, StreamKind};

/// A request received from an observer connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientRequest {
    /// Start watching one stream, replacing any current subscription.
    Subscribe {
        process_name: String,
        #[serde(default)]
        stream_kind: StreamKind,
    },

    /// Stop watching the current stream.
    Unsubscribe,

    /// One-shot literal search over a process log file.
    Search {
        process_name: String,
        pattern: String,
        #[serde(default)]
        stream_kind: StreamKind,
    },

    /// Request a fleet metrics snapshot.
    GetMetrics,
}

impl ClientRequest {
    /// Decode a request from a JSON text frame.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// An event sent to one observer connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Backlog batch delivered once per successful subscription.
    InitialLines { lines: Vec<String> },

    /// A live line from the watched stream.
    Line(LogLine),

    /// The subscription is active.
    SubscriptionConfirmed {
        process_name: String,
        stream_kind: StreamKind,
    },

    /// The connection is no longer watching any stream.
    Unsubscribed,

    /// Result of a search request.
    SearchResults {
        process_name: String,
        pattern: String,
        results: Vec<String>,
        count: usize,
    },

    /// Fleet metrics snapshot.
    Metrics(MetricsSnapshot),

    /// A request or the watched stream failed.
    Error { message: String },
}

impl ServerEvent {
    /// Confirmation event for a stream key.
    pub fn confirmed(key: &StreamKey) -> Self {
        Self::SubscriptionConfirmed {
            process_name: key.process_name.clone(),
            stream_kind: key.stream_kind,
        }
    }

    /// Error event from anything displayable.
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    /// Search results event; `count` always equals `results.len()`.
    pub fn search_results(process_name: String, pattern: String, results: Vec<String>) -> Self {
        Self::SearchResults {
            process_name,
            pattern,
            count: results.len(),
            results,
        }
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_subscribe_with_default_stream() {
        let req = ClientRequest::from_json(r#"{"type":"subscribe","processName":"api"}"#).unwrap();
        assert_eq!(
            req,
            ClientRequest::Subscribe {
                process_name: "api".to_string(),
                stream_kind: StreamKind::Out,
            }
        );
    }

    #[test]
    fn decodes_search_and_unit_requests() {
        let req = ClientRequest::from_json(
            r#"{"type":"search","processName":"api","pattern":"ERR","streamKind":"error"}"#,
        )
        .unwrap();
        assert!(matches!(
            req,
            ClientRequest::Search { stream_kind: StreamKind::Error, .. }
        ));
        assert_eq!(
            ClientRequest::from_json(r#"{"type":"getMetrics"}"#).unwrap(),
            ClientRequest::GetMetrics
        );
        assert_eq!(
            ClientRequest::from_json(r#"{"type":"unsubscribe"}"#).unwrap(),
            ClientRequest::Unsubscribe
        );
    }

    #[test]
    fn rejects_unknown_request_type() {
        assert!(ClientRequest::from_json(r#"{"type":"restart","processName":"api"}"#).is_err());
    }

    #[test]
    fn line_event_flattens_log_line() {
        let key = StreamKey::new("api", StreamKind::Out);
        let json = ServerEvent::Line(LogLine::now(&key, "hello".to_string()))
            .to_json()
            .unwrap();
        assert!(json.contains("\"type\":\"line\""));
        assert!(json.contains("\"processName\":\"api\""));
        assert!(json.contains("\"streamKind\":\"out\""));
        assert!(json.contains("\"message\":\"hello\""));
        assert!(json.contains("\"timestamp\""));
    }

    #[test]
    fn search_results_count_matches_results() {
        let event = ServerEvent::search_results(
            "api".to_string(),
            "GET".to_string(),
            vec!["GET /a".to_string(), "GET /b".to_string()],
        );
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"searchResults\""));
        assert!(json.contains("\"count\":2"));
    }

    #[test]
    fn unit_events_serialize_as_bare_tag() {
        assert_eq!(
            ServerEvent::Unsubscribed.to_json().unwrap(),
            r#"{"type":"unsubscribed"}"#
        );
    }
}
