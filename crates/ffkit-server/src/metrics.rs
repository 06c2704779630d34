//! Prometheus recorder and `/metrics` rendering.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at startup, before anything records a metric.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Method calls total (counter, labels: method).
pub const BRIDGE_CALLS_TOTAL: &str = "bridge_calls_total";
/// Method call failures total (counter, labels: method, code).
pub const BRIDGE_ERRORS_TOTAL: &str = "bridge_errors_total";
/// Method call duration (histogram, labels: method).
pub const BRIDGE_CALL_DURATION_SECONDS: &str = "bridge_call_duration_seconds";
/// Dropped event envelopes (counter, labels: category, reason).
pub const BRIDGE_EVENTS_DROPPED_TOTAL: &str = "bridge_events_dropped_total";
/// WebSocket connections opened (counter, labels: channel).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Open WebSocket connections (gauge, labels: channel).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
