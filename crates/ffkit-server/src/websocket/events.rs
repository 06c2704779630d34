//! Event channel: streams toolkit envelopes to the single subscriber.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use ffkit_bridge::Bridge;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL};

/// Close code sent when the bridge cannot take a subscriber.
const CLOSE_UNAVAILABLE: u16 = 1013;

/// Why an event session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSessionEnd {
    /// The bridge was not attached.
    Rejected,
    /// Another subscriber took over, or the bridge detached.
    Replaced,
    /// The client went away.
    ClientClosed,
    /// The server is shutting down.
    Shutdown,
}

/// Serve an event-channel socket. Connecting makes this socket the
/// subscriber; leaving detaches it only if it still is.
pub async fn run_event_session(
    mut ws: WebSocket,
    bridge: Arc<Bridge>,
    ping_interval: Duration,
    shutdown: CancellationToken,
) -> EventSessionEnd {
    let Some((handle, mut events)) = bridge.subscribe() else {
        warn!("event channel rejected, bridge not attached");
        let _ = ws
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_UNAVAILABLE,
                reason: "bridge not attached".into(),
            })))
            .await;
        return EventSessionEnd::Rejected;
    };

    info!(?handle, "event subscriber attached");
    counter!(WS_CONNECTIONS_TOTAL, "channel" => "events").increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE, "channel" => "events").increment(1.0);

    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut ping = tokio::time::interval(ping_interval);
    let _ = ping.tick().await;

    let end = loop {
        tokio::select! {
            () = shutdown.cancelled() => break EventSessionEnd::Shutdown,
            envelope = events.recv() => {
                let Some(envelope) = envelope else { break EventSessionEnd::Replaced };
                if ws_tx.send(Message::Text(envelope.to_string().into())).await.is_err() {
                    break EventSessionEnd::ClientClosed;
                }
            }
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break EventSessionEnd::ClientClosed,
                Some(Ok(_)) => {}
            },
            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break EventSessionEnd::ClientClosed;
                }
            }
        }
    };

    let detached = bridge.unsubscribe(handle);
    debug!(?end, detached, "event subscriber left");
    gauge!(WS_CONNECTIONS_ACTIVE, "channel" => "events").decrement(1.0);
    let _ = ws_tx.close().await;
    end
}
