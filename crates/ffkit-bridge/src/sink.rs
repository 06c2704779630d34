//! Result sink: the response path of one pending call.
//!
//! Resolving consumes the sink, so a call can only be answered once. A sink
//! dropped without being resolved answers with `INTERNAL_ERROR`, which keeps
//! the caller from waiting forever on a forgotten or panicked path.

use ffkit_core::MethodError;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

/// Terminal outcome of a call.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Success with a value (`Value::Null` for "no result").
    Success(Value),
    /// Failure with a code and message.
    Error(MethodError),
    /// The method is not handled.
    NotImplemented,
}

impl Resolution {
    /// Success carrying any serializable value.
    pub fn success(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Error(MethodError::internal(format!("Failed to encode result: {e}"))),
        }
    }

    /// Success with no result.
    pub fn null() -> Self {
        Self::Success(Value::Null)
    }

    /// Wire status name.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Error(_) => "error",
            Self::NotImplemented => "notImplemented",
        }
    }
}

impl From<Result<Value, MethodError>> for Resolution {
    fn from(result: Result<Value, MethodError>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Error(e),
        }
    }
}

/// Write side of a result channel.
#[derive(Debug)]
pub struct ResultSink {
    method: String,
    tx: Option<oneshot::Sender<Resolution>>,
}

/// Read side of a result channel.
#[derive(Debug)]
pub struct ResultReceiver {
    rx: oneshot::Receiver<Resolution>,
}

/// Create a result channel for a call to `method`.
pub fn channel(method: impl Into<String>) -> (ResultSink, ResultReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        ResultSink {
            method: method.into(),
            tx: Some(tx),
        },
        ResultReceiver { rx },
    )
}

impl ResultSink {
    /// Method this sink answers.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resolve with `resolution`.
    pub fn resolve(mut self, resolution: Resolution) {
        if let Some(tx) = self.tx.take() {
            // The receiver may be gone when the caller disconnected.
            let _ = tx.send(resolution);
        }
    }

    /// Resolve successfully.
    pub fn success(self, value: Value) {
        self.resolve(Resolution::Success(value));
    }

    /// Resolve with an error.
    pub fn error(self, error: MethodError) {
        self.resolve(Resolution::Error(error));
    }

    /// Resolve as not implemented.
    pub fn not_implemented(self) {
        self.resolve(Resolution::NotImplemented);
    }
}

impl Drop for ResultSink {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            warn!(method = %self.method, "result sink dropped without a resolution");
            let _ = tx.send(Resolution::Error(MethodError::internal(format!(
                "Call to {} was abandoned.",
                self.method
            ))));
        }
    }
}

impl ResultReceiver {
    /// Wait for the resolution.
    pub async fn recv(self) -> Resolution {
        self.rx.await.unwrap_or_else(|_| {
            Resolution::Error(MethodError::internal("Result channel closed."))
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
