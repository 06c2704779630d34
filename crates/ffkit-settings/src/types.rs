//! Settings type definitions.
//!
//! Field names are camelCase on disk. Every section is `#[serde(default)]`,
//! so a partial file only overrides what it names.

use std::path::PathBuf;

use ffkit_core::constants::{
    DEFAULT_ASYNC_CONCURRENCY_LIMIT, DEFAULT_SESSION_HISTORY_SIZE, SESSION_HISTORY_HARD_LIMIT,
};
use ffkit_core::Level;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FfkitSettings {
    /// Transport host settings.
    pub server: ServerSettings,
    /// Bridge dispatch settings.
    pub bridge: BridgeSettings,
    /// Toolkit backend settings.
    pub toolkit: ToolkitSettings,
    /// Tracing settings.
    pub logging: LoggingSettings,
}

impl FfkitSettings {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.bridge.async_concurrency_limit == 0 {
            return Err(SettingsError::invalid(
                "bridge.asyncConcurrencyLimit",
                "must be at least 1",
            ));
        }
        if self.bridge.event_queue_capacity == 0 {
            return Err(SettingsError::invalid(
                "bridge.eventQueueCapacity",
                "must be at least 1",
            ));
        }
        let history = self.toolkit.session_history_size;
        if history == 0 || history >= SESSION_HISTORY_HARD_LIMIT {
            return Err(SettingsError::invalid(
                "toolkit.sessionHistorySize",
                format!("must be in 1..{SESSION_HISTORY_HARD_LIMIT}, got {history}"),
            ));
        }
        if Level::from_value(self.toolkit.log_level).is_none() {
            return Err(SettingsError::invalid(
                "toolkit.logLevel",
                format!("{} is not a known level", self.toolkit.log_level),
            ));
        }
        Ok(())
    }
}

/// Transport host settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (0 picks a free one).
    pub port: u16,
    /// Largest accepted WebSocket message, in bytes.
    pub max_message_size: usize,
    /// Interval between server pings on open sockets.
    pub ping_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9850,
            max_message_size: 16 * 1024 * 1024,
            ping_interval_secs: 30,
        }
    }
}

/// Bridge dispatch settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    /// Concurrent blocking operations on the execution pool, and concurrent
    /// asynchronous executions in the toolkit.
    pub async_concurrency_limit: usize,
    /// Envelopes buffered for the event subscriber before drops start.
    pub event_queue_capacity: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            async_concurrency_limit: DEFAULT_ASYNC_CONCURRENCY_LIMIT,
            event_queue_capacity: 1024,
        }
    }
}

/// Toolkit backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolkitSettings {
    /// `ffmpeg` executable.
    pub ffmpeg_path: String,
    /// `ffprobe` executable.
    pub ffprobe_path: String,
    /// Sessions kept in history.
    pub session_history_size: usize,
    /// Initial toolkit log level (numeric `AV_LOG_*` value).
    pub log_level: i64,
    /// Directory named pipes are created in.
    pub pipe_directory: PathBuf,
    /// Directory the generated `fonts.conf` is written to.
    pub fontconfig_directory: PathBuf,
    /// Package name reported to callers.
    pub package_name: String,
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            session_history_size: DEFAULT_SESSION_HISTORY_SIZE,
            log_level: Level::AvLogInfo.value(),
            pipe_directory: std::env::temp_dir().join("ffkit-pipes"),
            fontconfig_directory: std::env::temp_dir().join("ffkit-fontconfig"),
            package_name: "https-gpl".to_string(),
        }
    }
}

/// Tracing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = FfkitSettings::default();
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.max_message_size, 16 * 1024 * 1024);
        assert_eq!(s.server.ping_interval_secs, 30);
        assert_eq!(s.bridge.event_queue_capacity, 1024);
        assert_eq!(s.toolkit.ffmpeg_path, "ffmpeg");
        assert_eq!(s.toolkit.log_level, 32);
        assert!(s.toolkit.pipe_directory.ends_with("ffkit-pipes"));
        assert_eq!(s.toolkit.package_name, "https-gpl");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn serializes_camel_case() {
        let v = serde_json::to_value(FfkitSettings::default()).unwrap();
        assert_eq!(v["bridge"]["asyncConcurrencyLimit"], 10);
        assert_eq!(v["toolkit"]["sessionHistorySize"], 10);
        assert_eq!(v["server"]["maxMessageSize"], 16 * 1024 * 1024);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let s: FfkitSettings = serde_json::from_str(r#"{"server": {"port": 1}}"#).unwrap();
        assert_eq!(s.server.port, 1);
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.bridge.async_concurrency_limit, 10);
    }

    // ── validate ────────────────────────────────────────────────────

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut s = FfkitSettings::default();
        s.bridge.async_concurrency_limit = 0;
        assert!(matches!(
            s.validate(),
            Err(SettingsError::InvalidValue { key: "bridge.asyncConcurrencyLimit", .. })
        ));
    }

    #[test]
    fn history_at_hard_limit_is_rejected() {
        let mut s = FfkitSettings::default();
        s.toolkit.session_history_size = SESSION_HISTORY_HARD_LIMIT;
        assert!(s.validate().is_err());
        s.toolkit.session_history_size = SESSION_HISTORY_HARD_LIMIT - 1;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut s = FfkitSettings::default();
        s.toolkit.log_level = 33;
        assert!(s.validate().is_err());
    }
}
