//! Method-channel wire frames.

use ffkit_bridge::{Invocation, Resolution};
use ffkit_core::{ErrorCode, MethodError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Id used when a frame could not be parsed far enough to read its id.
pub const UNKNOWN_ID: &str = "unknown";

/// Client → server call.
#[derive(Clone, Debug, Deserialize)]
pub struct CallFrame {
    /// Caller-chosen correlation id.
    pub id: String,
    /// Method and arguments.
    #[serde(flatten)]
    pub invocation: Invocation,
}

/// Server → client reply.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplyFrame {
    /// Correlation id copied from the call.
    pub id: String,
    /// `success`, `error` or `notImplemented`.
    pub status: &'static str,
    /// Result value on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MethodError>,
}

impl ReplyFrame {
    /// Reply for `id` carrying `resolution`.
    pub fn new(id: impl Into<String>, resolution: Resolution) -> Self {
        let status = resolution.status();
        let (result, error) = match resolution {
            Resolution::Success(value) => (Some(value), None),
            Resolution::Error(error) => (None, Some(error)),
            Resolution::NotImplemented => (None, None),
        };
        Self {
            id: id.into(),
            status,
            result,
            error,
        }
    }

    /// Reply to a frame that did not parse.
    pub fn malformed(reason: &str) -> Self {
        Self::new(
            UNKNOWN_ID,
            Resolution::Error(MethodError::new(
                ErrorCode::InvalidArguments,
                format!("Invalid JSON: {reason}"),
            )),
        )
    }

    /// Serialized form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize reply");
            String::new()
        })
    }
}

/// Parse a text frame into a call.
pub fn parse_call(text: &str) -> Result<CallFrame, ReplyFrame> {
    serde_json::from_str(text).map_err(|e| ReplyFrame::malformed(&e.to_string()))
}
