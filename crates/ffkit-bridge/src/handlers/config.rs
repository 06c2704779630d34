//! Toolkit configuration: levels, output routing, fonts, environment.

use std::collections::HashMap;

use ffkit_core::{Level, LogRedirectionStrategy, Signal};
use serde_json::{Value, json};

use super::HandlerResult;
use crate::context::BridgeContext;

pub(super) fn set_redirection(ctx: &BridgeContext, enabled: bool) -> HandlerResult {
    if enabled {
        ctx.toolkit.enable_redirection();
    } else {
        ctx.toolkit.disable_redirection();
    }
    Ok(Value::Null)
}

pub(super) fn set_logs(ctx: &BridgeContext, enabled: bool) -> HandlerResult {
    ctx.events.set_logs_enabled(enabled);
    Ok(Value::Null)
}

pub(super) fn set_statistics(ctx: &BridgeContext, enabled: bool) -> HandlerResult {
    ctx.events.set_statistics_enabled(enabled);
    Ok(Value::Null)
}

pub(super) fn log_level(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.log_level().value()))
}

pub(super) fn set_log_level(ctx: &BridgeContext, level: Level) -> HandlerResult {
    ctx.toolkit.set_log_level(level);
    Ok(Value::Null)
}

pub(super) fn session_history_size(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.session_history_size()))
}

pub(super) fn set_session_history_size(ctx: &BridgeContext, size: i64) -> HandlerResult {
    ctx.toolkit.set_session_history_size(size)?;
    Ok(Value::Null)
}

pub(super) fn log_redirection_strategy(ctx: &BridgeContext) -> HandlerResult {
    Ok(json!(ctx.toolkit.log_redirection_strategy().ordinal()))
}

pub(super) fn set_log_redirection_strategy(
    ctx: &BridgeContext,
    strategy: LogRedirectionStrategy,
) -> HandlerResult {
    ctx.toolkit.set_log_redirection_strategy(strategy);
    Ok(Value::Null)
}

pub(super) fn set_fontconfig_path(ctx: &BridgeContext, path: &str) -> HandlerResult {
    ctx.toolkit.set_fontconfig_configuration_path(path);
    Ok(Value::Null)
}

pub(super) fn set_font_directories(
    ctx: &BridgeContext,
    directories: Vec<String>,
    name_mapping: HashMap<String, String>,
) -> HandlerResult {
    ctx.toolkit.set_font_directories(directories, name_mapping);
    Ok(Value::Null)
}

pub(super) fn set_environment_variable(ctx: &BridgeContext, name: &str, value: &str) -> HandlerResult {
    ctx.toolkit.set_environment_variable(name, value);
    Ok(Value::Null)
}

pub(super) fn ignore_signal(ctx: &BridgeContext, signal: Signal) -> HandlerResult {
    ctx.toolkit.ignore_signal(signal);
    Ok(Value::Null)
}
