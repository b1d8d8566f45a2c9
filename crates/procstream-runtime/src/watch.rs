//! Reference-counted registry of active tailers.
//!
//! Maps each [`StreamKey`] to at most one [`WatchEntry`]. An entry exists
//! exactly while its subscriber set is non-empty: the first subscriber starts
//! a tailer, the last one leaving drops the entry, which cancels the tailer
//! task through its [`DropGuard`].
//!
//! The registry is a plain data structure. Callers serialize access to it
//! (see `SubscriptionManager`), so delivery always sees a consistent
//! subscriber set.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use procstream_core::{ConnectionId, LogLine, ServerEvent, StreamKey, StreamResult};
use tokio_util::sync::DropGuard;
use tracing::{debug, info};

use crate::sink::ConnectionSink;
use crate::tail::TailerGauge;

/// A freshly started tailer, handed to the registry by the start callback.
#[derive(Debug)]
pub struct TailerHandle {
    /// File being followed.
    pub path: PathBuf,
    /// Offset just past the last complete line at open time.
    pub delivered_offset: u64,
    /// Cancels the tailer task when dropped.
    pub guard: DropGuard,
}

/// One watched stream.
#[derive(Debug)]
pub struct WatchEntry {
    generation: u64,
    path: PathBuf,
    delivered_offset: u64,
    subscribers: HashMap<ConnectionId, ConnectionSink>,
    _tailer: DropGuard,
}

impl WatchEntry {
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset up to which lines have been fanned out.
    pub const fn delivered_offset(&self) -> u64 {
        self.delivered_offset
    }

    /// Sinks of the current subscribers.
    pub fn subscribers(&self) -> impl Iterator<Item = &ConnectionSink> {
        self.subscribers.values()
    }
}

/// Outcome of [`WatchRegistry::acquire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    /// A new tailer was started for this key.
    pub created: bool,
    pub generation: u64,
    pub path: PathBuf,
    pub delivered_offset: u64,
}

#[derive(Debug, Default)]
pub struct WatchRegistry {
    entries: HashMap<StreamKey, WatchEntry>,
    next_generation: u64,
    gauge: TailerGauge,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gauge that tailers started for this registry report to.
    pub const fn gauge(&self) -> &TailerGauge {
        &self.gauge
    }

    /// Tailers currently holding an open file handle.
    ///
    /// Can briefly exceed the number of entries while a released tailer task
    /// winds down.
    pub fn live_tailers(&self) -> usize {
        self.gauge.live()
    }

    pub fn contains(&self, key: &StreamKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &StreamKey) -> Option<&WatchEntry> {
        self.entries.get(key)
    }

    pub fn subscriber_count(&self, key: &StreamKey) -> usize {
        self.entries.get(key).map_or(0, |e| e.subscribers.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `sink` as a subscriber of `key`, starting a tailer if none exists.
    ///
    /// `start` receives the generation assigned to the new entry and must
    /// return the running tailer. If it fails the registry is unchanged.
    pub async fn acquire<F, Fut>(
        &mut self,
        key: &StreamKey,
        sink: ConnectionSink,
        start: F,
    ) -> StreamResult<Acquired>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = StreamResult<TailerHandle>>,
    {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscribers.insert(sink.id().clone(), sink);
            debug!(
                process = %key.process_name,
                stream = %key.stream_kind,
                subscribers = entry.subscribers.len(),
                "Joined existing tailer"
            );
            return Ok(Acquired {
                created: false,
                generation: entry.generation,
                path: entry.path.clone(),
                delivered_offset: entry.delivered_offset,
            });
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let handle = start(generation).await?;

        info!(
            process = %key.process_name,
            stream = %key.stream_kind,
            path = %handle.path.display(),
            generation,
            "Tailer started"
        );

        let acquired = Acquired {
            created: true,
            generation,
            path: handle.path.clone(),
            delivered_offset: handle.delivered_offset,
        };
        let mut subscribers = HashMap::new();
        subscribers.insert(sink.id().clone(), sink);
        self.entries.insert(
            key.clone(),
            WatchEntry {
                generation,
                path: handle.path,
                delivered_offset: handle.delivered_offset,
                subscribers,
                _tailer: handle.guard,
            },
        );
        Ok(acquired)
    }

    /// Remove `connection` from the subscribers of `key`.
    ///
    /// Returns true if that was the last subscriber and the tailer was closed.
    pub fn release(&mut self, key: &StreamKey, connection: &ConnectionId) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.subscribers.remove(connection);
        if !entry.subscribers.is_empty() {
            return false;
        }

        if let Some(entry) = self.entries.remove(key) {
            info!(
                process = %key.process_name,
                stream = %key.stream_kind,
                generation = entry.generation,
                "Tailer closed"
            );
        }
        true
    }

    /// Fan `lines` out to every current subscriber of `key`.
    ///
    /// Returns false when no entry of this `generation` exists any more; the
    /// caller is a retired tailer and should stop.
    pub fn deliver(
        &mut self,
        key: &StreamKey,
        generation: u64,
        lines: Vec<String>,
        boundary: u64,
    ) -> bool {
        let Some(entry) = self.current_mut(key, generation) else {
            return false;
        };

        for message in lines {
            let event = ServerEvent::Line(LogLine::now(key, message));
            for sink in entry.subscribers.values() {
                sink.try_deliver(event.clone());
            }
        }
        entry.delivered_offset = boundary;
        true
    }

    /// Record that the tailer for `key` restarted at offset 0.
    pub fn reset(&mut self, key: &StreamKey, generation: u64) -> bool {
        let Some(entry) = self.current_mut(key, generation) else {
            return false;
        };
        entry.delivered_offset = 0;
        true
    }

    /// Remove the entry for a tailer that failed, returning its subscribers.
    pub fn fail(&mut self, key: &StreamKey, generation: u64) -> Option<Vec<ConnectionSink>> {
        self.current_mut(key, generation)?;
        self.entries
            .remove(key)
            .map(|entry| entry.subscribers.into_values().collect())
    }

    fn current_mut(&mut self, key: &StreamKey, generation: u64) -> Option<&mut WatchEntry> {
        self.entries
            .get_mut(key)
            .filter(|entry| entry.generation == generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procstream_core::{StreamError, StreamKind};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn key() -> StreamKey {
        StreamKey::new("api", StreamKind::Out)
    }

    fn sink(id: &str) -> (ConnectionSink, mpsc::Receiver<ServerEvent>) {
        ConnectionSink::channel(ConnectionId::from(id), 16)
    }

    fn start_ok(
        token: CancellationToken,
    ) -> impl FnOnce(u64) -> std::future::Ready<StreamResult<TailerHandle>> {
        move |_| {
            std::future::ready(Ok(TailerHandle {
                path: PathBuf::from("/var/log/api-out.log"),
                delivered_offset: 42,
                guard: token.drop_guard(),
            }))
        }
    }

    #[tokio::test]
    async fn first_acquire_starts_one_tailer() {
        let mut registry = WatchRegistry::new();
        let token = CancellationToken::new();
        let (a, _rx_a) = sink("a");
        let (b, _rx_b) = sink("b");

        let first = registry.acquire(&key(), a, start_ok(token.clone())).await.unwrap();
        assert!(first.created);
        assert_eq!(first.delivered_offset, 42);

        let second = registry
            .acquire(&key(), b, start_ok(CancellationToken::new()))
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.generation, first.generation);
        assert_eq!(registry.subscriber_count(&key()), 2);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn last_release_cancels_tailer() {
        let mut registry = WatchRegistry::new();
        let token = CancellationToken::new();
        let (a, _rx_a) = sink("a");
        let (b, _rx_b) = sink("b");
        registry.acquire(&key(), a, start_ok(token.clone())).await.unwrap();
        registry
            .acquire(&key(), b, start_ok(CancellationToken::new()))
            .await
            .unwrap();

        assert!(!registry.release(&key(), &ConnectionId::from("a")));
        assert!(!token.is_cancelled());
        assert!(registry.release(&key(), &ConnectionId::from("b")));
        assert!(token.is_cancelled());
        assert!(!registry.contains(&key()));
        assert!(!registry.release(&key(), &ConnectionId::from("b")));
    }

    #[tokio::test]
    async fn failed_start_leaves_registry_unchanged() {
        let mut registry = WatchRegistry::new();
        let (a, _rx) = sink("a");
        let err = registry
            .acquire(&key(), a, |_| async {
                Err(StreamError::FileNotFound("/nope".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::FileNotFound(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn deliver_fans_out_in_order() {
        let mut registry = WatchRegistry::new();
        let (a, mut rx_a) = sink("a");
        let (b, mut rx_b) = sink("b");
        let acquired = registry
            .acquire(&key(), a, start_ok(CancellationToken::new()))
            .await
            .unwrap();
        registry
            .acquire(&key(), b, start_ok(CancellationToken::new()))
            .await
            .unwrap();

        assert!(registry.deliver(
            &key(),
            acquired.generation,
            vec!["one".to_string(), "two".to_string()],
            50
        ));
        assert_eq!(registry.get(&key()).unwrap().delivered_offset(), 50);

        for rx in [&mut rx_a, &mut rx_b] {
            for expected in ["one", "two"] {
                match rx.recv().await {
                    Some(ServerEvent::Line(line)) => assert_eq!(line.message, expected),
                    other => panic!("unexpected event: {other:?}"),
                }
            }
        }
    }

    #[tokio::test]
    async fn stale_generation_cannot_deliver() {
        let mut registry = WatchRegistry::new();
        let (a, _rx) = sink("a");
        let first = registry
            .acquire(&key(), a.clone(), start_ok(CancellationToken::new()))
            .await
            .unwrap();
        registry.release(&key(), a.id());
        let second = registry
            .acquire(&key(), a, start_ok(CancellationToken::new()))
            .await
            .unwrap();

        assert_ne!(first.generation, second.generation);
        assert!(!registry.deliver(&key(), first.generation, vec!["x".into()], 1));
        assert!(!registry.reset(&key(), first.generation));
        assert!(registry.fail(&key(), first.generation).is_none());
        assert!(registry.contains(&key()));
    }

    #[tokio::test]
    async fn fail_removes_entry_and_returns_subscribers() {
        let mut registry = WatchRegistry::new();
        let token = CancellationToken::new();
        let (a, _rx) = sink("a");
        let acquired = registry.acquire(&key(), a, start_ok(token.clone())).await.unwrap();

        let subscribers = registry.fail(&key(), acquired.generation).unwrap();
        assert_eq!(subscribers.len(), 1);
        assert!(token.is_cancelled());
        assert!(!registry.contains(&key()));
    }
}
