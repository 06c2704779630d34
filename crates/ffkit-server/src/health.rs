//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Whether the bridge is handling method calls.
    pub attached: bool,
    /// Whether an event-channel subscriber is connected.
    pub subscriber_attached: bool,
}

/// Build a health response from live state.
pub fn health_check(start_time: Instant, attached: bool, subscriber_attached: bool) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        attached,
        subscriber_attached,
    }
}
