//! Attach/detach lifecycle and the bridge facade.
//!
//! The bridge is *attached* while both an engine binding and a platform are
//! present. Entering that state registers the event broadcaster as the
//! toolkit's callbacks; leaving it clears the subscriber, the platform and
//! the callbacks. Calls made while unattached resolve not-implemented.

use std::sync::Arc;

use ffkit_core::{Toolkit, ToolkitCallbacks};
use ffkit_settings::BridgeSettings;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::context::BridgeContext;
use crate::dispatcher;
use crate::events::{EventBroadcaster, SubscriptionHandle};
use crate::platform::Platform;
use crate::pool::ExecutionPool;
use crate::request::Invocation;
use crate::sink::{Resolution, ResultSink};

#[derive(Default)]
struct Attachment {
    engine: bool,
    platform: Option<Arc<dyn Platform>>,
    context: Option<Arc<BridgeContext>>,
}

/// The method-channel adapter.
pub struct Bridge {
    toolkit: Arc<dyn Toolkit>,
    events: Arc<EventBroadcaster>,
    pool: ExecutionPool,
    attachment: RwLock<Attachment>,
}

impl Bridge {
    /// Unattached bridge over `toolkit`.
    pub fn new(toolkit: Arc<dyn Toolkit>, settings: &BridgeSettings) -> Self {
        Self {
            toolkit,
            events: Arc::new(EventBroadcaster::new(settings.event_queue_capacity)),
            pool: ExecutionPool::new(settings.async_concurrency_limit),
            attachment: RwLock::new(Attachment::default()),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Bind the engine.
    pub fn attach_engine(&self) {
        self.transition(|a| a.engine = true);
    }

    /// Unbind the engine.
    pub fn detach_engine(&self) {
        self.transition(|a| a.engine = false);
    }

    /// Attach the host platform.
    pub fn attach_platform(&self, platform: Arc<dyn Platform>) {
        self.transition(|a| a.platform = Some(platform));
    }

    /// Detach the host platform.
    pub fn detach_platform(&self) {
        self.transition(|a| a.platform = None);
    }

    /// Whether calls are currently handled.
    pub fn is_attached(&self) -> bool {
        self.attachment.read().context.is_some()
    }

    fn transition(&self, change: impl FnOnce(&mut Attachment)) {
        let mut attachment = self.attachment.write();
        let was_attached = attachment.context.is_some();
        change(&mut attachment);

        let platform = match (attachment.engine, attachment.platform.clone()) {
            (true, Some(platform)) => platform,
            _ => {
                if was_attached {
                    attachment.context = None;
                    attachment.platform = None;
                    self.events.clear();
                    self.toolkit.set_callbacks(None);
                    info!("bridge detached");
                }
                return;
            }
        };

        if !was_attached {
            let callbacks: Arc<dyn ToolkitCallbacks> = self.events.clone();
            self.toolkit.set_callbacks(Some(callbacks));
            info!(platform = %platform.name(), "bridge attached");
        }
        attachment.context = Some(Arc::new(BridgeContext {
            toolkit: Arc::clone(&self.toolkit),
            events: Arc::clone(&self.events),
            platform: Some(platform),
        }));
    }

    fn context(&self) -> Option<Arc<BridgeContext>> {
        self.attachment.read().context.clone()
    }

    // ── Method channel ──────────────────────────────────────────────

    /// Handle one call and wait for its resolution.
    pub async fn invoke(&self, invocation: &Invocation) -> Resolution {
        match self.context() {
            Some(ctx) => dispatcher::call(&ctx, &self.pool, invocation).await,
            None => {
                debug!(method = %invocation.method, "call while unattached");
                Resolution::NotImplemented
            }
        }
    }

    /// Handle one call, resolving `sink` when done.
    pub async fn handle(&self, invocation: &Invocation, sink: ResultSink) {
        match self.context() {
            Some(ctx) => dispatcher::dispatch(&ctx, &self.pool, invocation, sink).await,
            None => sink.not_implemented(),
        }
    }

    // ── Event channel ───────────────────────────────────────────────

    /// Become the event subscriber. `None` while unattached.
    pub fn subscribe(&self) -> Option<(SubscriptionHandle, mpsc::Receiver<Value>)> {
        let attachment = self.attachment.read();
        if attachment.context.is_none() {
            return None;
        }
        Some(self.events.attach())
    }

    /// Stop being the event subscriber. A stale handle does nothing.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.events.detach(handle)
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Event broadcaster.
    pub fn events(&self) -> &Arc<EventBroadcaster> {
        &self.events
    }

    /// Execution pool.
    pub fn pool(&self) -> &ExecutionPool {
        &self.pool
    }

    /// Toolkit driven by the bridge.
    pub fn toolkit(&self) -> &Arc<dyn Toolkit> {
        &self.toolkit
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EVENT_COMPLETE_CALLBACK_EVENT, EVENT_LOG_CALLBACK_EVENT};
    use crate::platform::LocalPlatform;
    use crate::sink;
    use assert_matches::assert_matches;
    use ffkit_core::SessionKind;
    use ffkit_runtime::testing::{Script, ScriptedRunner};
    use ffkit_runtime::{NativeToolkit, NativeToolkitOptions};
    use serde_json::json;
    use std::time::Duration;

    fn bridge() -> (Bridge, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::new());
        let toolkit = NativeToolkit::new(NativeToolkitOptions::default(), runner.clone());
        (Bridge::new(Arc::new(toolkit), &BridgeSettings::default()), runner)
    }

    fn attach(bridge: &Bridge) {
        bridge.attach_engine();
        bridge.attach_platform(Arc::new(LocalPlatform));
    }

    // ── Attachment ──────────────────────────────────────────────────

    #[tokio::test]
    async fn unattached_calls_are_not_implemented() {
        let (bridge, _) = bridge();
        let resolution = bridge.invoke(&Invocation::new("getLogLevel", json!({}))).await;
        assert_eq!(resolution, Resolution::NotImplemented);
        assert!(bridge.subscribe().is_none());
    }

    #[tokio::test]
    async fn engine_alone_does_not_attach() {
        let (bridge, _) = bridge();
        bridge.attach_engine();
        assert!(!bridge.is_attached());
        bridge.attach_platform(Arc::new(LocalPlatform));
        assert!(bridge.is_attached());
    }

    #[tokio::test]
    async fn attached_calls_are_handled() {
        let (bridge, _) = bridge();
        attach(&bridge);
        let resolution = bridge.invoke(&Invocation::new("getLogLevel", json!({}))).await;
        assert_matches!(resolution, Resolution::Success(v) => assert!(v.is_i64()));
    }

    #[tokio::test]
    async fn handle_resolves_sink() {
        let (bridge, _) = bridge();
        attach(&bridge);
        let (sink, receiver) = sink::channel("getSessionHistorySize");
        bridge
            .handle(&Invocation::new("getSessionHistorySize", json!({})), sink)
            .await;
        assert_eq!(receiver.recv().await, Resolution::Success(json!(10)));
    }

    #[tokio::test]
    async fn detach_clears_subscriber_and_callbacks() {
        let (bridge, runner) = bridge();
        attach(&bridge);
        let (_handle, mut rx) = bridge.subscribe().unwrap();
        assert!(bridge.events().has_subscriber());

        bridge.detach_platform();
        assert!(!bridge.is_attached());
        assert!(!bridge.events().has_subscriber());
        assert!(rx.recv().await.is_none());

        // Toolkit no longer reports into the broadcaster.
        runner.push_run(Script::exit(0));
        let session = bridge.toolkit().create_session(
            SessionKind::FFmpeg,
            vec!["-version".into()],
            ffkit_core::LogRedirectionStrategy::NeverPrintLogs,
        );
        bridge
            .toolkit()
            .execute(session.id, SessionKind::FFmpeg, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(bridge.events().dropped_count(), 0);
    }

    #[tokio::test]
    async fn engine_detach_drops_platform() {
        let (bridge, _) = bridge();
        attach(&bridge);
        bridge.detach_engine();
        bridge.attach_engine();
        assert!(!bridge.is_attached());
    }

    // ── Events ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn reattach_delivers_events_again() {
        let (bridge, runner) = bridge();
        attach(&bridge);
        bridge.detach_platform();
        attach(&bridge);

        let (_handle, mut rx) = bridge.subscribe().unwrap();
        let _ = bridge.invoke(&Invocation::new("enableLogs", json!({}))).await;

        runner.push_run(Script::exit(0).with_stderr(&["[info] hello"]));
        let created = bridge
            .invoke(&Invocation::new("ffmpegSession", json!({"arguments": ["-version"]})))
            .await;
        let id = match created {
            Resolution::Success(v) => v["sessionId"].clone(),
            other => panic!("unexpected {other:?}"),
        };
        let executed = bridge
            .invoke(&Invocation::new("ffmpegSessionExecute", json!({"sessionId": id})))
            .await;
        assert_eq!(executed, Resolution::null());

        let log = rx.recv().await.unwrap();
        assert_eq!(log[EVENT_LOG_CALLBACK_EVENT]["message"], "hello\n");
        let complete = rx.recv().await.unwrap();
        assert_eq!(complete[EVENT_COMPLETE_CALLBACK_EVENT]["sessionId"], id);
    }

    #[tokio::test]
    async fn unsubscribe_with_stale_handle_keeps_current() {
        let (bridge, _) = bridge();
        attach(&bridge);
        let (first, _rx1) = bridge.subscribe().unwrap();
        let (_second, _rx2) = bridge.subscribe().unwrap();
        assert!(!bridge.unsubscribe(first));
        assert!(bridge.events().has_subscriber());
    }
}
