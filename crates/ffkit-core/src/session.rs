//! Session snapshots and their lifecycle vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;
use crate::log::{Log, LogRedirectionStrategy};
use crate::media::MediaInformation;
use crate::statistics::Statistics;

/// Which executable a session drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    /// An `ffmpeg` run.
    FFmpeg,
    /// An `ffprobe` run.
    FFprobe,
    /// An `ffprobe` run whose output is parsed into [`MediaInformation`].
    MediaInformation,
}

impl SessionKind {
    /// Type code carried in the session map.
    #[must_use]
    pub const fn type_code(self) -> i64 {
        match self {
            Self::FFmpeg => 1,
            Self::FFprobe => 2,
            Self::MediaInformation => 3,
        }
    }

    /// Whether the session runs `ffprobe`.
    #[must_use]
    pub const fn is_probe(self) -> bool {
        matches!(self, Self::FFprobe | Self::MediaInformation)
    }
}

/// Session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, not started.
    Created,
    /// Executable running.
    Running,
    /// Could not be run to completion (spawn or I/O failure).
    Failed,
    /// Executable exited; see the return code.
    Completed,
}

impl SessionState {
    /// All states in ordinal order.
    pub const ALL: [SessionState; 4] = [
        SessionState::Created,
        SessionState::Running,
        SessionState::Failed,
        SessionState::Completed,
    ];

    /// Ordinal on the wire.
    #[must_use]
    pub const fn ordinal(self) -> i64 {
        match self {
            Self::Created => 0,
            Self::Running => 1,
            Self::Failed => 2,
            Self::Completed => 3,
        }
    }

    /// Look a state up by ordinal.
    #[must_use]
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.ordinal() == ordinal)
    }

    /// Whether the session can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Completed)
    }
}

/// Exit status of an executed session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnCode(i64);

impl ReturnCode {
    /// Successful run.
    pub const SUCCESS: ReturnCode = ReturnCode(0);
    /// Run cancelled by the caller.
    pub const CANCEL: ReturnCode = ReturnCode(255);

    /// Wrap a raw exit value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw exit value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Exit value 0.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Exit value 255.
    #[must_use]
    pub const fn is_cancel(self) -> bool {
        self.0 == Self::CANCEL.0
    }

    /// Neither success nor cancel.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !self.is_success() && !self.is_cancel()
    }
}

/// Point-in-time copy of a session held by the toolkit.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// Session id.
    pub id: SessionId,
    /// Executable the session drives.
    pub kind: SessionKind,
    /// When the session was created.
    pub create_time: DateTime<Utc>,
    /// When execution started.
    pub start_time: Option<DateTime<Utc>>,
    /// When execution ended.
    pub end_time: Option<DateTime<Utc>>,
    /// Command-line arguments, without the executable name.
    pub arguments: Vec<String>,
    /// Lifecycle state.
    pub state: SessionState,
    /// Exit status once completed.
    pub return_code: Option<ReturnCode>,
    /// Failure description once failed.
    pub fail_stack_trace: Option<String>,
    /// Captured log lines.
    pub logs: Vec<Log>,
    /// Captured statistics (FFmpeg sessions only).
    pub statistics: Vec<Statistics>,
    /// Parsed probe output (media-information sessions only).
    pub media_information: Option<MediaInformation>,
    /// Printing policy for this session's log lines.
    pub log_redirection_strategy: LogRedirectionStrategy,
}

impl Session {
    /// A fresh session in the `Created` state.
    #[must_use]
    pub fn new(
        id: SessionId,
        kind: SessionKind,
        arguments: Vec<String>,
        log_redirection_strategy: LogRedirectionStrategy,
    ) -> Self {
        Self {
            id,
            kind,
            create_time: Utc::now(),
            start_time: None,
            end_time: None,
            arguments,
            state: SessionState::Created,
            return_code: None,
            fail_stack_trace: None,
            logs: Vec::new(),
            statistics: Vec::new(),
            media_information: None,
            log_redirection_strategy,
        }
    }

    /// Arguments joined by single spaces.
    #[must_use]
    pub fn command(&self) -> String {
        self.arguments.join(" ")
    }

    /// Milliseconds between start and end, or 0 when either is unknown.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).num_milliseconds(),
            _ => 0,
        }
    }

    /// All log messages concatenated in arrival order.
    #[must_use]
    pub fn all_logs_as_string(&self) -> String {
        self.logs.iter().map(|log| log.message.as_str()).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
