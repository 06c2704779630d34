//! Session execution and cancellation.

use ffkit_core::constants::effective_wait_timeout;
use ffkit_core::{SessionId, SessionKind};
use serde_json::Value;
use tracing::debug;

use super::HandlerResult;
use crate::context::BridgeContext;

pub(super) async fn execute(
    ctx: &BridgeContext,
    id: SessionId,
    kind: SessionKind,
    wait_timeout: Option<i64>,
) -> HandlerResult {
    ctx.toolkit
        .execute(id, kind, effective_wait_timeout(wait_timeout))
        .await?;
    Ok(Value::Null)
}

pub(super) fn execute_async(
    ctx: &BridgeContext,
    id: SessionId,
    kind: SessionKind,
    wait_timeout: Option<i64>,
) -> HandlerResult {
    ctx.toolkit
        .execute_async(id, kind, effective_wait_timeout(wait_timeout))?;
    debug!(session_id = %id, ?kind, "session handed off");
    Ok(Value::Null)
}

pub(super) fn cancel(ctx: &BridgeContext, id: Option<SessionId>) -> HandlerResult {
    ctx.toolkit.cancel(id);
    Ok(Value::Null)
}
