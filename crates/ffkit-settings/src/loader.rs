//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FfkitSettings::default()`]
//! 2. If `~/.ffkit/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `FFKIT_*` environment variable overrides
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use ffkit_core::Level;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::FfkitSettings;

/// Resolve the path to the settings file (`~/.ffkit/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".ffkit").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FfkitSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or out-of-range values are
/// errors.
pub fn load_settings_from_path(path: &Path) -> Result<FfkitSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<FfkitSettings> {
    let defaults = serde_json::to_value(FfkitSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `FFKIT_*` environment overrides. Invalid values are ignored.
pub fn apply_env_overrides(settings: &mut FfkitSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup, so tests need not touch the
/// process environment.
pub fn apply_overrides(settings: &mut FfkitSettings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = string("FFKIT_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = checked(&lookup, "FFKIT_PORT", |v| parse_u16_range(v, 0, 65535)) {
        settings.server.port = v;
    }

    // ── Bridge ──────────────────────────────────────────────────────
    if let Some(v) = checked(&lookup, "FFKIT_ASYNC_CONCURRENCY", |v| {
        parse_usize_range(v, 1, 1024)
    }) {
        settings.bridge.async_concurrency_limit = v;
    }

    // ── Toolkit ─────────────────────────────────────────────────────
    if let Some(v) = string("FFKIT_FFMPEG_PATH") {
        settings.toolkit.ffmpeg_path = v;
    }
    if let Some(v) = string("FFKIT_FFPROBE_PATH") {
        settings.toolkit.ffprobe_path = v;
    }
    if let Some(v) = checked(&lookup, "FFKIT_SESSION_HISTORY_SIZE", |v| {
        parse_usize_range(v, 1, ffkit_core::constants::SESSION_HISTORY_HARD_LIMIT - 1)
    }) {
        settings.toolkit.session_history_size = v;
    }
    if let Some(v) = checked(&lookup, "FFKIT_LOG_LEVEL", parse_level) {
        settings.toolkit.log_level = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a toolkit level, either numeric (`32`) or by name (`info`).
pub fn parse_level(val: &str) -> Option<i64> {
    match val.parse::<i64>() {
        Ok(n) => Level::from_value(n).map(Level::value),
        Err(_) => Level::from_cli_name(&val.to_lowercase()).map(Level::value),
    }
}

fn checked<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let val = lookup(name)?;
    let result = parse(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 9850, "host": "127.0.0.1"}});
        let source = serde_json::json!({"server": {"port": 9000}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9000);
        assert_eq!(merged["server"]["host"], "127.0.0.1");
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_array_replaces() {
        let merged = deep_merge(
            serde_json::json!({"a": [1, 2, 3]}),
            serde_json::json!({"a": [4]}),
        );
        assert_eq!(merged["a"], serde_json::json!([4]));
    }

    // ── File layer ──────────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_file_layer(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.server.port, 9850);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"toolkit": {"ffmpegPath": "/opt/ffmpeg/bin/ffmpeg"}, "bridge": {"asyncConcurrencyLimit": 4}}"#,
        )
        .unwrap();
        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.toolkit.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(settings.toolkit.ffprobe_path, "ffprobe");
        assert_eq!(settings.bridge.async_concurrency_limit, 4);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_file_layer(&path), Err(SettingsError::Json(_))));
    }

    #[test]
    fn load_out_of_range_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"toolkit": {"sessionHistorySize": 5000}}"#).unwrap();
        assert!(matches!(
            load_settings_from_path(&path),
            Err(SettingsError::InvalidValue { key: "toolkit.sessionHistorySize", .. })
        ));
    }

    // ── Env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let mut s = FfkitSettings::default();
        apply_overrides(
            &mut s,
            env(&[
                ("FFKIT_HOST", "0.0.0.0"),
                ("FFKIT_PORT", "0"),
                ("FFKIT_ASYNC_CONCURRENCY", "3"),
                ("FFKIT_FFPROBE_PATH", "/usr/local/bin/ffprobe"),
                ("FFKIT_SESSION_HISTORY_SIZE", "50"),
                ("FFKIT_LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.server.port, 0);
        assert_eq!(s.bridge.async_concurrency_limit, 3);
        assert_eq!(s.toolkit.ffprobe_path, "/usr/local/bin/ffprobe");
        assert_eq!(s.toolkit.session_history_size, 50);
        assert_eq!(s.toolkit.log_level, 48);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut s = FfkitSettings::default();
        apply_overrides(
            &mut s,
            env(&[
                ("FFKIT_PORT", "70000"),
                ("FFKIT_ASYNC_CONCURRENCY", "0"),
                ("FFKIT_SESSION_HISTORY_SIZE", "1000"),
                ("FFKIT_LOG_LEVEL", "loud"),
                ("FFKIT_HOST", ""),
            ]),
        );
        assert_eq!(s.server.port, 9850);
        assert_eq!(s.bridge.async_concurrency_limit, 10);
        assert_eq!(s.toolkit.session_history_size, 10);
        assert_eq!(s.toolkit.log_level, 32);
        assert_eq!(s.server.host, "127.0.0.1");
    }

    // ── Parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_level_accepts_numbers_and_names() {
        assert_eq!(parse_level("24"), Some(24));
        assert_eq!(parse_level("WARNING"), Some(24));
        assert_eq!(parse_level("25"), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u16_range("8080", 1, 65535), Some(8080));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_usize_range("abc", 1, 10), None);
    }
}
