//! Method channel: one client socket, many in-flight calls.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use ffkit_bridge::Bridge;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::frames::{self, ReplyFrame};
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL};

/// Outbound reply queue depth per connection.
const REPLY_QUEUE: usize = 256;

/// Answer one text frame.
#[instrument(skip_all, fields(method, id))]
pub async fn handle_text(text: &str, bridge: &Bridge) -> ReplyFrame {
    let call = match frames::parse_call(text) {
        Ok(call) => call,
        Err(reply) => {
            warn!("malformed call frame");
            return reply;
        }
    };

    let span = tracing::Span::current();
    let _ = span.record("method", call.invocation.method.as_str());
    let _ = span.record("id", call.id.as_str());
    debug!("dispatching call");

    let resolution = bridge.invoke(&call.invocation).await;
    ReplyFrame::new(call.id, resolution)
}

/// Serve a method-channel socket until the client leaves or shutdown.
pub async fn run_method_session(
    ws: WebSocket,
    bridge: Arc<Bridge>,
    ping_interval: Duration,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_QUEUE);

    info!("method channel connected");
    counter!(WS_CONNECTIONS_TOTAL, "channel" => "method").increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE, "channel" => "method").increment(1.0);

    let outbound = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        let _ = ping.tick().await;
        loop {
            tokio::select! {
                reply = reply_rx.recv() => {
                    let Some(text) = reply else { break };
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = ws_tx.close().await;
    });

    loop {
        let msg = tokio::select! {
            () = shutdown.cancelled() => break,
            msg = ws_rx.next() => msg,
        };
        let Some(Ok(msg)) = msg else { break };

        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => {
                    info!(len = data.len(), "ignoring non-UTF8 binary frame");
                    continue;
                }
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        // Each call resolves independently so long jobs do not hold up
        // quick queries on the same socket.
        let bridge = Arc::clone(&bridge);
        let reply_tx = reply_tx.clone();
        let _ = tokio::spawn(async move {
            let reply = handle_text(&text, &bridge).await;
            if reply_tx.send(reply.to_json()).await.is_err() {
                debug!(id = %reply.id, "client gone before reply");
            }
        });
    }

    drop(reply_tx);
    info!("method channel disconnected");
    gauge!(WS_CONNECTIONS_ACTIVE, "channel" => "method").decrement(1.0);
    // In-flight calls keep their sender clones; the forwarder ends once the
    // last of them replies.
    if shutdown.is_cancelled() {
        outbound.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffkit_bridge::LocalPlatform;
    use ffkit_core::ErrorCode;
    use ffkit_runtime::testing::ScriptedRunner;
    use ffkit_runtime::{NativeToolkit, NativeToolkitOptions};
    use ffkit_settings::BridgeSettings;

    fn attached_bridge() -> Bridge {
        let toolkit = NativeToolkit::new(NativeToolkitOptions::default(), Arc::new(ScriptedRunner::new()));
        let bridge = Bridge::new(Arc::new(toolkit), &BridgeSettings::default());
        bridge.attach_engine();
        bridge.attach_platform(Arc::new(LocalPlatform));
        bridge
    }

    #[tokio::test]
    async fn replies_with_call_id() {
        let bridge = attached_bridge();
        let reply = handle_text(r#"{"id":"a1","method":"getSessionHistorySize"}"#, &bridge).await;
        assert_eq!(reply.id, "a1");
        assert_eq!(reply.status, "success");
        assert_eq!(reply.result, Some(serde_json::json!(10)));
    }

    #[tokio::test]
    async fn malformed_frame_gets_unknown_id() {
        let bridge = attached_bridge();
        let reply = handle_text("[]", &bridge).await;
        assert_eq!(reply.id, frames::UNKNOWN_ID);
        assert_eq!(reply.error.unwrap().code, ErrorCode::InvalidArguments);
    }

    #[tokio::test]
    async fn unknown_method_is_not_implemented() {
        let bridge = attached_bridge();
        let reply = handle_text(r#"{"id":"b","method":"nope"}"#, &bridge).await;
        assert_eq!(reply.status, "notImplemented");
        assert!(reply.result.is_none() && reply.error.is_none());
    }
}
