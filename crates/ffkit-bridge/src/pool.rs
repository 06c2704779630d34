//! Bounded execution pool for blocking calls.
//!
//! Submission never waits: every unit is spawned immediately and queues on
//! a semaphore until a slot is free. Each unit owns one [`ResultSink`]; a
//! panic inside the unit resolves it with `INTERNAL_ERROR`.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ffkit_core::MethodError;
use futures::FutureExt;
use metrics::counter;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info_span};

use crate::sink::{Resolution, ResultSink};

/// Fixed-size pool of concurrent units.
pub struct ExecutionPool {
    permits: Arc<Semaphore>,
    limit: usize,
    queued: Arc<AtomicUsize>,
}

impl ExecutionPool {
    /// Pool running at most `limit` units at once.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Units currently running.
    pub fn running(&self) -> usize {
        self.limit - self.permits.available_permits()
    }

    /// Units waiting for a slot.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// Run `work` on the pool and resolve `sink` with its outcome.
    pub fn submit<F>(&self, sink: ResultSink, work: F)
    where
        F: Future<Output = Resolution> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let queued = Arc::clone(&self.queued);
        let _ = queued.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("pool_unit", method = %sink.method());

        let _ = tokio::spawn(
            async move {
                let permit = permits.acquire_owned().await;
                let _ = queued.fetch_sub(1, Ordering::Relaxed);
                let Ok(_permit) = permit else {
                    sink.error(MethodError::internal("Execution pool is closed."));
                    return;
                };

                debug!("unit started");
                match AssertUnwindSafe(work).catch_unwind().await {
                    Ok(resolution) => sink.resolve(resolution),
                    Err(panic) => {
                        let msg = panic_message(&panic);
                        error!(panic = %msg, "pool unit panicked");
                        counter!("bridge_pool_panics_total").increment(1);
                        let message = format!("Call to {} failed unexpectedly.", sink.method());
                        sink.error(MethodError::internal(message));
                    }
                }
            }
            .instrument(span),
        );
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
