//! Per-connection outbound queue.
//!
//! Each connection owns a bounded channel of [`ServerEvent`]s. Fan-out from a
//! tailer uses [`ConnectionSink::try_deliver`], which never waits: when the
//! queue is full the event is dropped for that connection only, so one slow
//! reader cannot stall the other subscribers of a stream.
//!
//! The last [`CONTROL_RESERVE`] slots of every queue are kept free of live
//! traffic. A subscription's `initialLines` and `subscriptionConfirmed` are
//! queued into them with [`ConnectionSink::try_deliver_pair`], so a switch of
//! stream is announced even while the queue is full of the old stream's lines.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use procstream_core::{ConnectionId, ServerEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Queue slots that live events never occupy.
pub const CONTROL_RESERVE: usize = 2;

/// Sending half of a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionSink {
    id: ConnectionId,
    sender: mpsc::Sender<ServerEvent>,
    dropped: Arc<AtomicU64>,
}

impl ConnectionSink {
    /// Create a sink and the receiver the transport drains.
    ///
    /// `capacity` live events fit in the queue; [`CONTROL_RESERVE`] more slots
    /// are added on top.
    pub fn channel(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (sender, receiver) = mpsc::channel(capacity + CONTROL_RESERVE);
        (
            Self {
                id,
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    pub const fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Queue an event without waiting.
    ///
    /// Returns false if the event was dropped because the queue is full or
    /// the connection is gone.
    pub fn try_deliver(&self, event: ServerEvent) -> bool {
        // Holding the reserve as well keeps it out of reach of live traffic
        match self.sender.try_reserve_many(CONTROL_RESERVE + 1) {
            Ok(mut permits) => match permits.next() {
                Some(permit) => {
                    permit.send(event);
                    true
                }
                None => false,
            },
            Err(TrySendError::Full(())) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(connection = %self.id, dropped, "Outbound queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(())) => {
                debug!(connection = %self.id, "Outbound queue closed");
                false
            }
        }
    }

    /// Queue two events back to back, or neither, without waiting.
    ///
    /// May use the control reserve. Returns false if the queue has fewer
    /// than two free slots or the connection is gone.
    pub fn try_deliver_pair(&self, first: ServerEvent, second: ServerEvent) -> bool {
        let Ok(mut permits) = self.sender.try_reserve_many(2) else {
            return false;
        };
        match (permits.next(), permits.next()) {
            (Some(a), Some(b)) => {
                a.send(first);
                b.send(second);
                true
            }
            _ => false,
        }
    }

    /// Queue a direct reply, waiting for room.
    ///
    /// Used for request/response traffic on the connection's own task, where
    /// backpressure only slows that connection.
    pub async fn reply(&self, event: ServerEvent) -> bool {
        self.sender.send(event).await.is_ok()
    }

    /// Events dropped so far because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Whether the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
