//! Server configuration.

use std::time::Duration;

use ffkit_settings::ServerSettings;
use serde::{Deserialize, Serialize};

/// Configuration for the transport host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Interval between server-initiated Ping frames, in seconds.
    pub ping_interval_secs: u64,
}

impl ServerConfig {
    /// Config from the `server` settings section.
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_message_size: settings.max_message_size,
            ping_interval_secs: settings.ping_interval_secs,
        }
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ping interval as a [`Duration`], never shorter than one second.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_message_size: 16 * 1024 * 1024,
            ping_interval_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback_on_any_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_address(), "127.0.0.1:0");
        assert_eq!(cfg.max_message_size, 16 * 1024 * 1024);
    }

    #[test]
    fn from_settings_copies_fields() {
        let settings = ServerSettings {
            host: "0.0.0.0".into(),
            port: 9000,
            max_message_size: 1024,
            ping_interval_secs: 5,
        };
        let cfg = ServerConfig::from_settings(&settings);
        assert_eq!(cfg.bind_address(), "0.0.0.0:9000");
        assert_eq!(cfg.max_message_size, 1024);
        assert_eq!(cfg.ping_interval(), Duration::from_secs(5));
    }

    #[test]
    fn zero_ping_interval_is_clamped() {
        let cfg = ServerConfig {
            ping_interval_secs: 0,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.ping_interval(), Duration::from_secs(1));
    }
}
