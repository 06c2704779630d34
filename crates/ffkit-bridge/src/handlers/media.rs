//! Statistics and media information.

use ffkit_core::constants::effective_wait_timeout;
use ffkit_core::{MediaInformation, MethodError, Session, SessionId, SessionKind};
use serde_json::Value;
use tracing::debug;

use super::HandlerResult;
use crate::context::BridgeContext;
use crate::marshal;

fn lookup_kind(ctx: &BridgeContext, id: SessionId, kind: SessionKind) -> Result<Session, MethodError> {
    let session = ctx.toolkit.session(id)?;
    if session.kind == kind {
        Ok(session)
    } else {
        Err(MethodError::wrong_session_kind(kind))
    }
}

pub(super) async fn all_statistics(
    ctx: &BridgeContext,
    id: SessionId,
    wait_timeout: Option<i64>,
) -> HandlerResult {
    let _ = lookup_kind(ctx, id, SessionKind::FFmpeg)?;
    ctx.toolkit
        .wait_for_messages(id, effective_wait_timeout(wait_timeout))
        .await;
    let session = lookup_kind(ctx, id, SessionKind::FFmpeg)?;
    Ok(marshal::statistics_list(&session.statistics))
}

pub(super) fn statistics(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    let session = lookup_kind(ctx, id, SessionKind::FFmpeg)?;
    Ok(marshal::statistics_list(&session.statistics))
}

pub(super) fn media_information(ctx: &BridgeContext, id: SessionId) -> HandlerResult {
    let session = lookup_kind(ctx, id, SessionKind::MediaInformation)?;
    Ok(marshal::maybe_media_information(session.media_information.as_ref()))
}

pub(super) fn parse(output: &str, with_error: bool) -> HandlerResult {
    match MediaInformation::from_json(output) {
        Ok(info) => Ok(marshal::media_information(&info)),
        Err(e) if with_error => Err(e.into()),
        Err(e) => {
            debug!(error = %e, "ffprobe output did not parse");
            Ok(Value::Null)
        }
    }
}
