//! Error types for the toolkit and the method channel.
//!
//! - [`ToolkitError`]: failures reported by a [`Toolkit`](crate::toolkit::Toolkit)
//!   implementation
//! - [`rpc`]: the wire-level [`ErrorCode`](rpc::ErrorCode) and
//!   [`MethodError`](rpc::MethodError) a call resolves with

pub mod rpc;

use thiserror::Error;

use crate::ids::SessionId;
use crate::session::SessionKind;

/// Failure reported by the toolkit.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ToolkitError {
    /// No session with this id is held.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The session exists but drives a different executable.
    #[error("session {id} is a {actual:?} session, expected {expected:?}")]
    WrongSessionKind {
        /// Session id.
        id: SessionId,
        /// Kind the operation needs.
        expected: SessionKind,
        /// Kind the session has.
        actual: SessionKind,
    },

    /// Session history size outside `1..SESSION_HISTORY_HARD_LIMIT`.
    #[error("invalid session history size {0}")]
    InvalidHistorySize(i64),

    /// ffprobe output could not be parsed.
    #[error("failed to parse ffprobe output: {0}")]
    MediaInformationParse(String),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ToolkitError {
    /// Shorthand for a wrong-kind failure.
    #[must_use]
    pub fn wrong_kind(id: SessionId, expected: SessionKind, actual: SessionKind) -> Self {
        Self::WrongSessionKind {
            id,
            expected,
            actual,
        }
    }
}
