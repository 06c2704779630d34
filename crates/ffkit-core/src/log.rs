//! Toolkit log entries and levels.
//!
//! Levels carry the numeric values the native toolkit uses (`AV_LOG_*`), so
//! they can cross the method channel as plain integers and be compared with
//! `<=` to decide what gets printed.

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Toolkit log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Level {
    /// Output written straight to stderr by the toolkit itself.
    AvLogStderr,
    /// Print nothing.
    AvLogQuiet,
    /// Something went really wrong; the process will crash.
    AvLogPanic,
    /// Unrecoverable error.
    AvLogFatal,
    /// Recoverable error.
    AvLogError,
    /// Something looks wrong.
    AvLogWarning,
    /// Standard information.
    AvLogInfo,
    /// Detailed information.
    AvLogVerbose,
    /// Debugging output.
    AvLogDebug,
    /// Extremely verbose debugging output.
    AvLogTrace,
}

impl Level {
    /// All levels, lowest value first.
    pub const ALL: [Level; 10] = [
        Level::AvLogStderr,
        Level::AvLogQuiet,
        Level::AvLogPanic,
        Level::AvLogFatal,
        Level::AvLogError,
        Level::AvLogWarning,
        Level::AvLogInfo,
        Level::AvLogVerbose,
        Level::AvLogDebug,
        Level::AvLogTrace,
    ];

    /// Numeric value as used by the toolkit.
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            Self::AvLogStderr => -16,
            Self::AvLogQuiet => -8,
            Self::AvLogPanic => 0,
            Self::AvLogFatal => 8,
            Self::AvLogError => 16,
            Self::AvLogWarning => 24,
            Self::AvLogInfo => 32,
            Self::AvLogVerbose => 40,
            Self::AvLogDebug => 48,
            Self::AvLogTrace => 56,
        }
    }

    /// Look a level up by its numeric value.
    #[must_use]
    pub fn from_value(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.value() == value)
    }

    /// Name accepted by the executables' `-loglevel` flag.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::AvLogStderr | Self::AvLogQuiet => "quiet",
            Self::AvLogPanic => "panic",
            Self::AvLogFatal => "fatal",
            Self::AvLogError => "error",
            Self::AvLogWarning => "warning",
            Self::AvLogInfo => "info",
            Self::AvLogVerbose => "verbose",
            Self::AvLogDebug => "debug",
            Self::AvLogTrace => "trace",
        }
    }

    /// Parse the bracketed tag printed in front of each line under
    /// `-loglevel level+...` (e.g. `warning`).
    #[must_use]
    pub fn from_cli_name(name: &str) -> Option<Self> {
        match name {
            "quiet" => Some(Self::AvLogQuiet),
            "panic" => Some(Self::AvLogPanic),
            "fatal" => Some(Self::AvLogFatal),
            "error" => Some(Self::AvLogError),
            "warning" => Some(Self::AvLogWarning),
            "info" => Some(Self::AvLogInfo),
            "verbose" => Some(Self::AvLogVerbose),
            "debug" => Some(Self::AvLogDebug),
            "trace" => Some(Self::AvLogTrace),
            _ => None,
        }
    }
}

impl From<Level> for i64 {
    fn from(level: Level) -> Self {
        level.value()
    }
}

impl TryFrom<i64> for Level {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("unknown log level {value}"))
    }
}

/// One log line captured for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Session that produced the line.
    pub session_id: SessionId,
    /// Level, when the toolkit reported one.
    pub level: Option<Level>,
    /// Message text, including its trailing newline if the toolkit sent one.
    pub message: String,
}

impl Log {
    /// Create a log entry.
    #[must_use]
    pub fn new(session_id: SessionId, level: Option<Level>, message: impl Into<String>) -> Self {
        Self {
            session_id,
            level,
            message: message.into(),
        }
    }
}

/// Where session log lines are printed in addition to being delivered.
///
/// Ordinals are part of the method-channel contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum LogRedirectionStrategy {
    /// Always print.
    AlwaysPrintLogs,
    /// Print only when no callbacks at all are registered.
    #[default]
    PrintLogsWhenNoCallbacksDefined,
    /// Print only when the global log callback is not registered.
    PrintLogsWhenGlobalCallbackNotDefined,
    /// Print only when the session has no callback of its own.
    PrintLogsWhenSessionCallbackNotDefined,
    /// Never print.
    NeverPrintLogs,
}

impl LogRedirectionStrategy {
    /// All strategies in ordinal order.
    pub const ALL: [LogRedirectionStrategy; 5] = [
        LogRedirectionStrategy::AlwaysPrintLogs,
        LogRedirectionStrategy::PrintLogsWhenNoCallbacksDefined,
        LogRedirectionStrategy::PrintLogsWhenGlobalCallbackNotDefined,
        LogRedirectionStrategy::PrintLogsWhenSessionCallbackNotDefined,
        LogRedirectionStrategy::NeverPrintLogs,
    ];

    /// Ordinal on the wire.
    #[must_use]
    pub fn ordinal(self) -> i64 {
        match self {
            Self::AlwaysPrintLogs => 0,
            Self::PrintLogsWhenNoCallbacksDefined => 1,
            Self::PrintLogsWhenGlobalCallbackNotDefined => 2,
            Self::PrintLogsWhenSessionCallbackNotDefined => 3,
            Self::NeverPrintLogs => 4,
        }
    }

    /// Look a strategy up by ordinal.
    #[must_use]
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.ordinal() == ordinal)
    }
}

impl From<LogRedirectionStrategy> for i64 {
    fn from(strategy: LogRedirectionStrategy) -> Self {
        strategy.ordinal()
    }
}

impl TryFrom<i64> for LogRedirectionStrategy {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or_else(|| format!("unknown log redirection strategy {value}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
