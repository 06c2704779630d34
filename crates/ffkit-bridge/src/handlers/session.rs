//! Session creation, introspection and queries.

use ffkit_core::constants::effective_wait_timeout;
use ffkit_core::{
    LogRedirectionStrategy, MethodError, Session, SessionId, SessionKind, SessionState,
};
use serde_json::{Value, json};

use super::HandlerResult;
use crate::context::BridgeContext;
use crate::marshal;

fn lookup(ctx: &BridgeContext, id: SessionId) -> Result<Session, MethodError> {
    ctx.toolkit.session(id).map_err(MethodError::from)
}

async fn lookup_after_wait(
    ctx: &BridgeContext,
    id: SessionId,
    wait_timeout: Option<i64>,
) -> Result<Session, MethodError> {
    let _ = lookup(ctx, id)?;
    ctx.toolkit
        .wait_for_messages(id, effective_wait_timeout(wait_timeout))
        .await;
    lookup(ctx, id)
}

pub(super) fn create(ctx: &BridgeContext, kind: SessionKind, arguments: Vec<String>) -> HandlerResult {
    let session = ctx
        .toolkit
        .create_session(kind, arguments, LogRedirectionStrategy::NeverPrintLogs);
    Ok(marshal::session(&session))
}

pub(super) fn end_time(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    let session = lookup(ctx, id)?;
    Ok(json!(session.end_time.map(|t| t.timestamp_millis())))
}

pub(super) fn duration(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    Ok(json!(lookup(ctx, id)?.duration_ms()))
}

pub(super) async fn all_logs(ctx: &BridgeContext, id: SessionId, wait_timeout: Option<i64>) -> HandlerResult {
    let session = lookup_after_wait(ctx, id, wait_timeout).await?;
    Ok(marshal::logs(&session.logs))
}

pub(super) fn logs(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    Ok(marshal::logs(&lookup(ctx, id)?.logs))
}

pub(super) async fn all_logs_as_string(
    ctx: &BridgeContext,
    id: SessionId,
    wait_timeout: Option<i64>,
) -> HandlerResult {
    let session = lookup_after_wait(ctx, id, wait_timeout).await?;
    Ok(json!(session.all_logs_as_string()))
}

pub(super) fn state(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    Ok(json!(lookup(ctx, id)?.state.ordinal()))
}

pub(super) fn return_code(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    Ok(json!(lookup(ctx, id)?.return_code.map(|rc| rc.value())))
}

pub(super) fn fail_stack_trace(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    Ok(json!(lookup(ctx, id)?.fail_stack_trace))
}

pub(super) fn has_messages_in_transmit(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    let _ = lookup(ctx, id)?;
    Ok(json!(ctx.toolkit.messages_in_transmit(id) > 0))
}

pub(super) fn messages_in_transmit(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    Ok(json!(ctx.toolkit.messages_in_transmit(id)))
}

pub(super) fn get(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    Ok(marshal::session(&lookup(ctx, id)?))
}

pub(super) fn last(ctx: &BridgeContext) -> HandlerResult {
    Ok(marshal::maybe_session(ctx.toolkit.last_session().as_ref()))
}

pub(super) fn last_completed(ctx: &BridgeContext) -> HandlerResult {
    Ok(marshal::maybe_session(ctx.toolkit.last_completed_session().as_ref()))
}

pub(super) fn all(ctx: &BridgeContext) -> HandlerResult {
    Ok(marshal::sessions(&ctx.toolkit.sessions()))
}

pub(super) fn clear(ctx: &BridgeContext) -> HandlerResult {
    ctx.toolkit.clear_sessions();
    Ok(Value::Null)
}

pub(super) fn by_state(ctx: &BridgeContext, state: SessionState) -> HandlerResult {
    Ok(marshal::sessions(&ctx.toolkit.sessions_by_state(state)))
}

pub(super) fn by_kind(ctx: &BridgeContext, kind: SessionKind) -> HandlerResult {
    Ok(marshal::sessions(&ctx.toolkit.sessions_by_kind(kind)))
}
