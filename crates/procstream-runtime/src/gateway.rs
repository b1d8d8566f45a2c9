//! Connection-facing request dispatch.
//!
//! The gateway is transport-agnostic: a transport registers a connection,
//! feeds it decoded (or raw) requests and drains the connection's outbound
//! queue. Every reply goes to the originating connection only.

use std::sync::Arc;

use procstream_core::{
    ClientRequest, ConnectionId, ProcessControlPort, ServerEvent, StreamKind, StreamResult,
    StreamSettings,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::MetricsSampler;
use crate::search::{SearchExecutor, SearchOutcome};
use crate::subscription::SubscriptionManager;

#[derive(Debug, Clone)]
pub struct StreamGateway {
    manager: SubscriptionManager,
    search: SearchExecutor,
    sampler: MetricsSampler,
}

impl StreamGateway {
    pub fn new(control: Arc<dyn ProcessControlPort>, settings: StreamSettings) -> Self {
        let search = SearchExecutor::new(settings.search_max_results);
        Self {
            sampler: MetricsSampler::new(Arc::clone(&control)),
            manager: SubscriptionManager::new(control, settings),
            search,
        }
    }

    pub const fn manager(&self) -> &SubscriptionManager {
        &self.manager
    }

    pub const fn sampler(&self) -> &MetricsSampler {
        &self.sampler
    }

    pub fn settings(&self) -> &StreamSettings {
        self.manager.settings()
    }

    /// Register a connection; the transport drains the returned receiver.
    pub async fn connect(&self, connection: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        self.manager.connect(connection).await
    }

    /// Release everything held for a closed connection.
    pub async fn disconnect(&self, connection: &ConnectionId) {
        self.manager.on_disconnect(connection).await;
    }

    /// Decode and handle one JSON text frame.
    ///
    /// A frame that does not decode produces an `error` event; the connection
    /// stays open.
    pub async fn handle_frame(&self, connection: &ConnectionId, text: &str) {
        match ClientRequest::from_json(text) {
            Ok(request) => self.handle(connection, request).await,
            Err(err) => {
                debug!(connection = %connection, error = %err, "Malformed request frame");
                self.reply(connection, ServerEvent::error(format!("Invalid request: {err}")))
                    .await;
            }
        }
    }

    pub async fn handle(&self, connection: &ConnectionId, request: ClientRequest) {
        match request {
            ClientRequest::Subscribe {
                process_name,
                stream_kind,
            } => {
                // Success events are queued by the manager under its lock
                if let Err(err) = self
                    .manager
                    .subscribe(connection, &process_name, stream_kind)
                    .await
                {
                    warn!(
                        connection = %connection,
                        process = %process_name,
                        stream = %stream_kind,
                        error = %err,
                        "Subscribe failed"
                    );
                    self.reply(connection, ServerEvent::error(&err)).await;
                }
            }
            ClientRequest::Unsubscribe => {
                self.manager.unsubscribe(connection).await;
                self.reply(connection, ServerEvent::Unsubscribed).await;
            }
            ClientRequest::Search {
                process_name,
                pattern,
                stream_kind,
            } => {
                let event = match self.search(&process_name, &pattern, stream_kind).await {
                    Ok(outcome) => ServerEvent::search_results(process_name, pattern, outcome.lines),
                    Err(err) => {
                        debug!(connection = %connection, process = %process_name, error = %err, "Search failed");
                        ServerEvent::error(&err)
                    }
                };
                self.reply(connection, event).await;
            }
            ClientRequest::GetMetrics => {
                let event = match self.sampler.sample().await {
                    Ok(snapshot) => ServerEvent::Metrics(snapshot),
                    Err(err) => ServerEvent::error(&err),
                };
                self.reply(connection, event).await;
            }
        }
    }

    /// Search the log file of one process stream.
    pub async fn search(
        &self,
        process_name: &str,
        pattern: &str,
        stream_kind: StreamKind,
    ) -> StreamResult<SearchOutcome> {
        let path = self
            .manager
            .resolve_log_path(process_name, stream_kind)
            .await?;
        self.search.search(&path, pattern).await
    }

    /// Push a metrics snapshot to one connection without waiting.
    ///
    /// Used by periodic pushes; a full queue skips this sample.
    pub async fn push_metrics(&self, connection: &ConnectionId) {
        let Some(sink) = self.manager.sink(connection).await else {
            return;
        };
        let event = match self.sampler.sample().await {
            Ok(snapshot) => ServerEvent::Metrics(snapshot),
            Err(err) => ServerEvent::error(&err),
        };
        sink.try_deliver(event);
    }

    async fn reply(&self, connection: &ConnectionId, event: ServerEvent) {
        match self.manager.sink(connection).await {
            Some(sink) => {
                sink.reply(event).await;
            }
            None => debug!(connection = %connection, "Reply to unknown connection dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticProcesses;
    use procstream_core::{ProcessInfo, ProcessStatus};
    use std::io::Write;
    use tempfile::TempDir;

    fn gateway(dir: &TempDir) -> StreamGateway {
        let api = ProcessInfo::new("api", ProcessStatus::Online).with_log_paths(
            dir.path().join("api-out.log"),
            dir.path().join("api-error.log"),
        );
        StreamGateway::new(
            Arc::new(StaticProcesses::new(vec![api])),
            StreamSettings::default(),
        )
    }

    #[tokio::test]
    async fn malformed_frame_yields_error_event() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        let conn = ConnectionId::from("c1");
        let mut rx = gateway.connect(conn.clone()).await;

        gateway.handle_frame(&conn, "{not json").await;
        assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));

        gateway.handle_frame(&conn, r#"{"type":"getMetrics"}"#).await;
        assert!(matches!(rx.recv().await, Some(ServerEvent::Metrics(_))));
    }

    #[tokio::test]
    async fn search_replies_to_requester() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("api-error.log")).unwrap();
        writeln!(file, "boot\nERROR one\nERROR two").unwrap();

        let gateway = gateway(&dir);
        let conn = ConnectionId::from("c1");
        let other = ConnectionId::from("c2");
        let mut rx = gateway.connect(conn.clone()).await;
        let mut other_rx = gateway.connect(other.clone()).await;

        gateway
            .handle(
                &conn,
                ClientRequest::Search {
                    process_name: "api".to_string(),
                    pattern: "ERROR".to_string(),
                    stream_kind: StreamKind::Error,
                },
            )
            .await;

        match rx.recv().await {
            Some(ServerEvent::SearchResults { results, count, .. }) => {
                assert_eq!(count, 2);
                assert_eq!(results, vec!["ERROR one", "ERROR two"]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn search_of_unknown_process_is_error_event() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        let conn = ConnectionId::from("c1");
        let mut rx = gateway.connect(conn.clone()).await;

        gateway
            .handle(
                &conn,
                ClientRequest::Search {
                    process_name: "ghost".to_string(),
                    pattern: "x".to_string(),
                    stream_kind: StreamKind::Out,
                },
            )
            .await;
        match rx.recv().await {
            Some(ServerEvent::Error { message }) => assert!(message.contains("ghost")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsubscribe_always_confirms() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        let conn = ConnectionId::from("c1");
        let mut rx = gateway.connect(conn.clone()).await;

        gateway.handle(&conn, ClientRequest::Unsubscribe).await;
        assert_eq!(rx.recv().await, Some(ServerEvent::Unsubscribed));
    }

    #[tokio::test]
    async fn metrics_failure_is_error_event() {
        let gateway = StreamGateway::new(
            Arc::new(StaticProcesses::unavailable()),
            StreamSettings::default(),
        );
        let conn = ConnectionId::from("c1");
        let mut rx = gateway.connect(conn.clone()).await;

        gateway.push_metrics(&conn).await;
        assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));
    }
}
