//! Event fan-out to the single event-channel subscriber.
//!
//! [`EventBroadcaster`] is handed to the toolkit as its
//! [`ToolkitCallbacks`]. Each callback becomes a one-key envelope pushed to
//! the current subscriber. With no subscriber, or with a full subscriber
//! queue, the envelope is dropped and counted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ffkit_core::{Log, Session, Statistics, ToolkitCallbacks};
use metrics::counter;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};

use crate::marshal;

/// Envelope key for log lines.
pub const EVENT_LOG_CALLBACK_EVENT: &str = "FFmpegKitLogCallbackEvent";
/// Envelope key for statistics samples.
pub const EVENT_STATISTICS_CALLBACK_EVENT: &str = "FFmpegKitStatisticsCallbackEvent";
/// Envelope key for finished sessions.
pub const EVENT_COMPLETE_CALLBACK_EVENT: &str = "FFmpegKitCompleteCallbackEvent";

/// Identifies one attach; detaching with a stale handle does nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscriber {
    handle: SubscriptionHandle,
    tx: mpsc::Sender<Value>,
}

/// Single-subscriber event channel.
pub struct EventBroadcaster {
    subscriber: Mutex<Option<Subscriber>>,
    next_handle: AtomicU64,
    logs_enabled: AtomicBool,
    statistics_enabled: AtomicBool,
    queue_capacity: usize,
    dropped: AtomicU64,
}

impl EventBroadcaster {
    /// Broadcaster whose subscribers buffer up to `queue_capacity` envelopes.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscriber: Mutex::new(None),
            next_handle: AtomicU64::new(1),
            logs_enabled: AtomicBool::new(false),
            statistics_enabled: AtomicBool::new(false),
            queue_capacity: queue_capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Attach a subscriber, replacing the current one (whose receiver then
    /// closes).
    pub fn attach(&self) -> (SubscriptionHandle, mpsc::Receiver<Value>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let previous = self.subscriber.lock().replace(Subscriber { handle, tx });
        if let Some(previous) = previous {
            debug!(replaced = previous.handle.0, handle = handle.0, "event subscriber replaced");
        } else {
            debug!(handle = handle.0, "event subscriber attached");
        }
        (handle, rx)
    }

    /// Detach `handle` if it is still the current subscriber.
    pub fn detach(&self, handle: SubscriptionHandle) -> bool {
        let mut slot = self.subscriber.lock();
        if slot.as_ref().is_some_and(|s| s.handle == handle) {
            *slot = None;
            debug!(handle = handle.0, "event subscriber detached");
            true
        } else {
            false
        }
    }

    /// Drop the current subscriber, whoever it is.
    pub fn clear(&self) {
        if self.subscriber.lock().take().is_some() {
            debug!("event subscriber cleared");
        }
    }

    /// Whether a subscriber is attached.
    pub fn has_subscriber(&self) -> bool {
        self.subscriber.lock().is_some()
    }

    /// Set whether log envelopes are emitted.
    pub fn set_logs_enabled(&self, enabled: bool) {
        self.logs_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether log envelopes are emitted.
    pub fn logs_enabled(&self) -> bool {
        self.logs_enabled.load(Ordering::Relaxed)
    }

    /// Set whether statistics envelopes are emitted.
    pub fn set_statistics_enabled(&self, enabled: bool) {
        self.statistics_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether statistics envelopes are emitted.
    pub fn statistics_enabled(&self) -> bool {
        self.statistics_enabled.load(Ordering::Relaxed)
    }

    /// Envelopes dropped so far.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn emit(&self, category: &'static str, payload: Value) {
        let mut envelope = Map::new();
        let _ = envelope.insert(category.to_string(), payload);

        let slot = self.subscriber.lock();
        let Some(subscriber) = slot.as_ref() else {
            trace!(category, "no event subscriber, dropping");
            self.record_drop(category, "no_subscriber");
            return;
        };
        match subscriber.tx.try_send(Value::Object(envelope)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(category, "event queue full, dropping");
                self.record_drop(category, "queue_full");
            }
            Err(TrySendError::Closed(_)) => {
                trace!(category, "event receiver closed, dropping");
                self.record_drop(category, "closed");
            }
        }
    }

    fn record_drop(&self, category: &'static str, reason: &'static str) {
        let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
        counter!("bridge_events_dropped_total", "category" => category, "reason" => reason)
            .increment(1);
    }
}

impl ToolkitCallbacks for EventBroadcaster {
    fn on_log(&self, log: &Log) {
        if self.logs_enabled() {
            self.emit(EVENT_LOG_CALLBACK_EVENT, marshal::log(log));
        }
    }

    fn on_statistics(&self, statistics: &Statistics) {
        if self.statistics_enabled() {
            self.emit(EVENT_STATISTICS_CALLBACK_EVENT, marshal::statistics(statistics));
        }
    }

    fn on_session_complete(&self, session: &Session) {
        self.emit(EVENT_COMPLETE_CALLBACK_EVENT, marshal::session(session));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
