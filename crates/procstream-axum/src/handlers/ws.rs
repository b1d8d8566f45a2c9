//! WebSocket transport for the streaming gateway.
//!
//! `GET /api/ws` upgrades to a text WebSocket carrying the JSON connection
//! protocol: `{"type": "subscribe", "processName": ..., "streamKind": ...}`
//! and friends inbound, tagged server events outbound.
//!
//! ## Lifecycle
//!
//! 1. A fresh connection id is registered with the gateway, which hands
//!    back the connection's bounded outbound queue.
//! 2. Two tasks run side by side:
//!    * **Ingest** reads text frames and feeds them to the gateway.
//!    * **Egress** drains the outbound queue into text frames.
//! 3. When metrics push is configured, a third task enqueues a snapshot
//!    every interval.
//! 4. Whichever of ingest/egress finishes first (or server shutdown) ends
//!    the session; the gateway then releases the connection's subscription.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use procstream_core::ConnectionId;
use procstream_runtime::StreamGateway;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// `GET /api/ws` - WebSocket upgrade endpoint for log streaming.
pub async fn stream_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_stream_ws(socket, state))
}

async fn handle_stream_ws(socket: WebSocket, state: AppState) {
    let connection = ConnectionId::new(Uuid::new_v4().to_string());
    let mut outbound = state.gateway.connect(connection.clone()).await;

    info!(connection = %connection, "Stream connection opened");

    let (ws_sender, ws_receiver) = socket.split();

    // ── Ingest: text frames → gateway ────────────────────────────────────

    let mut ingest = tokio::spawn({
        let gateway = state.gateway.clone();
        let connection = connection.clone();
        async move {
            let mut ws_receiver = ws_receiver;

            while let Some(msg_result) = ws_receiver.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        gateway.handle_frame(&connection, text.as_str()).await;
                    }
                    Ok(Message::Binary(data)) => {
                        debug!(connection = %connection, bytes = data.len(), "Binary frame ignored");
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    // Ping/pong are answered by the transport
                    Ok(_) => {}
                }
            }
        }
    });

    // ── Egress: outbound queue → text frames ─────────────────────────────

    let mut egress = tokio::spawn({
        let connection = connection.clone();
        async move {
            let mut ws_sender = ws_sender;

            while let Some(event) = outbound.recv().await {
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(connection = %connection, error = %e, "Failed to encode event");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let metrics = state
        .gateway
        .settings()
        .metrics_interval
        .map(|period| spawn_metrics_push(state.gateway.clone(), connection.clone(), period));

    tokio::select! {
        _ = &mut ingest => { egress.abort(); }
        _ = &mut egress => { ingest.abort(); }
        () = state.shutdown.cancelled() => {
            ingest.abort();
            egress.abort();
        }
    }

    if let Some(task) = metrics {
        task.abort();
    }

    // Always release: the tailer must not outlive its last subscriber
    state.gateway.disconnect(&connection).await;

    info!(connection = %connection, "Stream connection closed");
}

fn spawn_metrics_push(
    gateway: StreamGateway,
    connection: ConnectionId,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            gateway.push_metrics(&connection).await;
        }
    })
}
