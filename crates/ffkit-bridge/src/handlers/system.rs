//! Build metadata, pipes and platform interaction.

use ffkit_core::{ErrorCode, MethodError};
use serde_json::{Value, json};
use tokio::fs::{File, OpenOptions};
use tracing::{debug, warn};

use super::HandlerResult;
use crate::context::BridgeContext;
use crate::platform::{DocumentRequest, Platform, SelectOutcome};

// ── Metadata ────────────────────────────────────────────────────────

pub(super) fn arch(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.arch()))
}

pub(super) async fn version(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.version().await))
}

pub(super) fn is_lts_build(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.is_lts_build()))
}

pub(super) async fn build_date(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.build_date().await))
}

pub(super) fn package_name(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.package_name()))
}

pub(super) async fn external_libraries(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.external_libraries().await))
}

pub(super) fn platform(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.platform_name()))
}

// ── Pipes ───────────────────────────────────────────────────────────

pub(super) async fn register_new_pipe(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.register_new_pipe().await))
}

pub(super) async fn close_pipe(ctx: &BridgeContext, path: &str) -> HandlerResult {
    ctx.toolkit.close_pipe(path).await;
    Ok(Value::Null)
}

/// Copy `input` into `pipe`. Resolves 0 once the copy is complete.
pub(super) async fn write_to_pipe(input: &str, pipe: &str) -> HandlerResult {
    let copied = async {
        let mut source = File::open(input).await?;
        let mut sink = OpenOptions::new().write(true).open(pipe).await?;
        tokio::io::copy(&mut source, &mut sink).await
    }
    .await;

    match copied {
        Ok(bytes) => {
            debug!(input, pipe, bytes, "pipe write finished");
            Ok(json!(0))
        }
        Err(e) => {
            warn!(input, pipe, error = %e, "pipe write failed");
            Err(MethodError::new(
                ErrorCode::WriteToPipeFailed,
                format!("Failed to write {input} to {pipe}: {e}"),
            ))
        }
    }
}

// ── Documents ───────────────────────────────────────────────────────

fn require_platform(ctx: &BridgeContext) -> Result<&dyn Platform, MethodError> {
    ctx.platform.as_deref().ok_or_else(|| {
        MethodError::new(ErrorCode::InvalidActivity, "Platform is not available.")
    })
}

pub(super) async fn select_document(ctx: &BridgeContext, request: DocumentRequest) -> HandlerResult {
    let platform = require_platform(ctx)?;
    match platform.select_document(request).await {
        Ok(SelectOutcome::Selected(uri)) => Ok(json!(uri)),
        Ok(SelectOutcome::Cancelled(code)) => {
            Err(MethodError::new(ErrorCode::SelectCancelled, code.to_string()))
        }
        Err(e) => Err(MethodError::new(ErrorCode::SelectFailed, e.to_string())),
    }
}

pub(super) async fn saf_parameter(ctx: &BridgeContext, uri: &str, open_mode: &str) -> HandlerResult {
    let platform = require_platform(ctx)?;
    platform
        .saf_parameter(uri, open_mode)
        .await
        .map(Value::String)
        .map_err(|e| MethodError::new(ErrorCode::GetSafParameterFailed, e.to_string()))
}
