//! Per-connection subscription state and tailer lifecycle.
//!
//! Each connection is either idle or watching exactly one [`StreamKey`].
//! The watch registry, subscriber sets and connection states share one
//! `tokio::sync::Mutex`, so subscribe, unsubscribe, disconnect and tailer
//! delivery are totally ordered.
//!
//! # Backlog boundary
//!
//! A joining connection's backlog is read from disk up to the offset the
//! tailer has already fanned out, while holding the same lock that delivery
//! takes. Every later line reaches the connection through the tailer, so
//! there is no gap and no duplicate between backlog and live lines.

use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::{Arc, Weak};

use futures_util::{Stream, StreamExt};
use procstream_core::{
    ConnectionId, ProcessControlPort, ServerEvent, StreamError, StreamKey, StreamKind,
    StreamResult, StreamSettings,
};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::sink::ConnectionSink;
use crate::tail::{TailEvent, TailOptions, Tailer, read_backlog};
use crate::watch::{TailerHandle, WatchRegistry};

#[derive(Debug)]
struct ConnectionState {
    sink: ConnectionSink,
    watching: Option<StreamKey>,
}

#[derive(Debug, Default)]
struct HubState {
    registry: WatchRegistry,
    connections: HashMap<ConnectionId, ConnectionState>,
}

/// Drives the Idle/Watching state machine of every connection.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SubscriptionManager {
    state: Arc<Mutex<HubState>>,
    control: Arc<dyn ProcessControlPort>,
    settings: Arc<StreamSettings>,
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SubscriptionManager {
    pub fn new(control: Arc<dyn ProcessControlPort>, settings: StreamSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState::default())),
            control,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Attach a new connection and return the receiving end of its queue.
    pub async fn connect(&self, connection: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (sink, receiver) = ConnectionSink::channel(connection, self.settings.outbound_buffer);
        self.register(sink).await;
        receiver
    }

    /// Attach a connection with an existing outbound sink.
    ///
    /// Re-registering a known connection replaces its sink and keeps its
    /// subscription.
    pub async fn register(&self, sink: ConnectionSink) {
        let mut state = self.state.lock().await;
        let id = sink.id().clone();
        debug!(connection = %id, "Connection registered");
        match state.connections.get_mut(&id) {
            Some(existing) => existing.sink = sink,
            None => {
                state.connections.insert(
                    id,
                    ConnectionState {
                        sink,
                        watching: None,
                    },
                );
            }
        }
    }

    /// Look up the log file of one process stream.
    pub async fn resolve_log_path(
        &self,
        process_name: &str,
        stream_kind: StreamKind,
    ) -> StreamResult<PathBuf> {
        let info = self.control.describe_process(process_name).await?;
        info.log_path(stream_kind)
            .map(PathBuf::from)
            .ok_or_else(|| StreamError::LogPathUnavailable {
                process: process_name.to_string(),
                stream: stream_kind,
            })
    }

    /// Start watching `process_name`/`stream_kind`, replacing any current
    /// subscription of `connection`.
    ///
    /// On success the connection has been sent `initialLines` followed by
    /// `subscriptionConfirmed`, ahead of any live line. On failure the
    /// connection is left idle.
    ///
    /// The registry and the connection state agree at every await point, so
    /// a subscribe that is cancelled part way leaves nothing for
    /// [`on_disconnect`](Self::on_disconnect) to miss.
    pub async fn subscribe(
        &self,
        connection: &ConnectionId,
        process_name: &str,
        stream_kind: StreamKind,
    ) -> StreamResult<()> {
        let key = StreamKey::new(process_name, stream_kind);
        let path = self.resolve_log_path(process_name, stream_kind).await;
        let options = TailOptions::from(self.settings.as_ref());

        // First subscriber: open the file before taking the lock
        let opened = match &path {
            Ok(path) if !self.is_tailing(&key).await => Some(Tailer::open(path, options).await),
            _ => None,
        };

        let mut guard = self.state.lock().await;
        let HubState {
            registry,
            connections,
        } = &mut *guard;

        let Some(conn) = connections.get_mut(connection) else {
            return Err(StreamError::UnknownConnection(connection.to_string()));
        };

        if let Some(old) = conn.watching.take() {
            registry.release(&old, connection);
            debug!(connection = %connection, previous = %old, "Released previous subscription");
        }

        let path = path?;
        let sink = conn.sink.clone();
        let weak = Arc::downgrade(&self.state);
        let gauge = registry.gauge().clone();
        let tail_key = key.clone();

        let acquired = registry
            .acquire(&key, sink.clone(), move |generation| async move {
                let tailer = match opened {
                    Some(opened) => opened?,
                    None => Tailer::open(&path, options).await?,
                }
                .tracked(&gauge);
                let delivered_offset = tailer.delivered_offset();
                let cancel = CancellationToken::new();
                let events = tailer.follow(cancel.clone());
                tokio::spawn(drive_tailer(weak, tail_key, generation, events));
                Ok(TailerHandle {
                    path,
                    delivered_offset,
                    guard: cancel.drop_guard(),
                })
            })
            .await?;
        conn.watching = Some(key.clone());

        let backlog = read_backlog(
            &acquired.path,
            acquired.delivered_offset,
            self.settings.initial_lines,
        )
        .await
        .and_then(|lines| {
            let backlog_len = lines.len();
            let queued = sink.try_deliver_pair(
                ServerEvent::InitialLines { lines },
                ServerEvent::confirmed(&key),
            );
            if queued {
                Ok(backlog_len)
            } else {
                Err(StreamError::QueueFull(connection.to_string()))
            }
        });

        let backlog_len = match backlog {
            Ok(len) => len,
            Err(err) => {
                conn.watching = None;
                registry.release(&key, connection);
                return Err(err);
            }
        };

        info!(
            connection = %connection,
            process = %key.process_name,
            stream = %key.stream_kind,
            backlog = backlog_len,
            subscribers = registry.subscriber_count(&key),
            "Subscribed"
        );
        Ok(())
    }

    /// Stop watching. Returns false if the connection was already idle.
    pub async fn unsubscribe(&self, connection: &ConnectionId) -> bool {
        let mut guard = self.state.lock().await;
        let HubState {
            registry,
            connections,
        } = &mut *guard;

        let Some(key) = connections
            .get_mut(connection)
            .and_then(|conn| conn.watching.take())
        else {
            return false;
        };

        registry.release(&key, connection);
        info!(connection = %connection, process = %key.process_name, stream = %key.stream_kind, "Unsubscribed");
        true
    }

    /// Unsubscribe and forget the connection. Safe to call more than once.
    pub async fn on_disconnect(&self, connection: &ConnectionId) {
        let mut guard = self.state.lock().await;
        let HubState {
            registry,
            connections,
        } = &mut *guard;

        if let Some(conn) = connections.remove(connection) {
            if let Some(key) = conn.watching {
                registry.release(&key, connection);
            }
            if conn.sink.dropped() > 0 {
                warn!(connection = %connection, dropped = conn.sink.dropped(), "Connection dropped events");
            }
            debug!(connection = %connection, "Connection closed");
        }
    }

    /// The stream `connection` is watching, if any.
    pub async fn is_watching(&self, connection: &ConnectionId) -> Option<StreamKey> {
        let state = self.state.lock().await;
        state
            .connections
            .get(connection)
            .and_then(|conn| conn.watching.clone())
    }

    /// Outbound sink of a registered connection.
    pub async fn sink(&self, connection: &ConnectionId) -> Option<ConnectionSink> {
        let state = self.state.lock().await;
        state.connections.get(connection).map(|conn| conn.sink.clone())
    }

    pub async fn subscriber_count(&self, key: &StreamKey) -> usize {
        self.state.lock().await.registry.subscriber_count(key)
    }

    pub async fn is_tailing(&self, key: &StreamKey) -> bool {
        self.state.lock().await.registry.contains(key)
    }

    /// Tailers currently holding an open file handle.
    pub async fn live_tailers(&self) -> usize {
        self.state.lock().await.registry.live_tailers()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }
}

/// Forward one tailer's events into the registry until it is retired.
async fn drive_tailer(
    state: Weak<Mutex<HubState>>,
    key: StreamKey,
    generation: u64,
    events: impl Stream<Item = TailEvent>,
) {
    let mut events = pin!(events);

    while let Some(event) = events.next().await {
        let Some(state) = state.upgrade() else {
            break;
        };
        let mut guard = state.lock().await;
        let HubState {
            registry,
            connections,
        } = &mut *guard;

        match event {
            TailEvent::Lines { lines, boundary } => {
                if !registry.deliver(&key, generation, lines, boundary) {
                    break;
                }
            }
            TailEvent::Rotated => {
                if !registry.reset(&key, generation) {
                    break;
                }
            }
            TailEvent::Failed(err) => {
                let Some(subscribers) = registry.fail(&key, generation) else {
                    break;
                };
                warn!(
                    process = %key.process_name,
                    stream = %key.stream_kind,
                    subscribers = subscribers.len(),
                    error = %err,
                    "Tailer failed, subscribers returned to idle"
                );
                for sink in subscribers {
                    sink.try_deliver(ServerEvent::error(&err));
                    if let Some(conn) = connections.get_mut(sink.id()) {
                        conn.watching = None;
                    }
                }
                break;
            }
        }
    }

    debug!(process = %key.process_name, stream = %key.stream_kind, generation, "Tailer task finished");
}
