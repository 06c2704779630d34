//! Method-channel error types.
//!
//! Every failed call resolves with a machine-readable [`ErrorCode`] and a
//! human-readable message. The codes are the strings the UI layer matches on,
//! so renaming one is a breaking change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::ToolkitError;
use crate::session::SessionKind;

// ─────────────────────────────────────────────────────────────────────────────
// Error codes
// ─────────────────────────────────────────────────────────────────────────────

/// Error codes a method call can fail with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Argument validation
    /// `sessionId` missing or not an integer.
    InvalidSession,
    /// `arguments` missing or not a list of strings.
    InvalidArguments,
    /// `ffprobeJsonOutput` missing.
    #[serde(rename = "INVALID_FFPROBE_JSON_OUTPUT")]
    InvalidFfprobeJsonOutput,
    /// `path` missing.
    InvalidPath,
    /// `fontDirectory` missing.
    InvalidFontDirectory,
    /// `fontDirectoryList` missing.
    InvalidFontDirectoryList,
    /// `ffmpegPipePath` missing.
    InvalidPipePath,
    /// Environment variable name missing.
    InvalidName,
    /// Environment variable value missing.
    InvalidValue,
    /// Signal missing or unsupported.
    InvalidSignal,
    /// Log level missing or unknown.
    InvalidLevel,
    /// Session history size missing or out of range.
    InvalidSize,
    /// Session state missing or unknown.
    InvalidSessionState,
    /// Log redirection strategy missing or unknown.
    InvalidLogRedirectionStrategy,
    /// Pipe input missing.
    InvalidInput,
    /// Pipe path missing.
    InvalidPipe,
    /// `writable` missing.
    InvalidWritable,
    /// `openMode` missing.
    InvalidOpenMode,
    /// `uri` missing.
    InvalidUri,

    // Lookup
    /// No session with the given id.
    SessionNotFound,
    /// Session is not an FFmpeg session.
    #[serde(rename = "NOT_FFMPEG_SESSION")]
    NotFfmpegSession,
    /// Session is not an FFprobe session.
    #[serde(rename = "NOT_FFPROBE_SESSION")]
    NotFfprobeSession,
    /// Session is not a media-information session.
    NotMediaInformationSession,

    // Operation failures
    /// ffprobe output could not be parsed.
    ParseFailed,
    /// Copying into a pipe failed.
    WriteToPipeFailed,

    // Platform
    /// No platform is attached.
    InvalidActivity,
    /// The user dismissed the document picker.
    SelectCancelled,
    /// The document picker failed.
    SelectFailed,
    /// Resolving a SAF parameter failed.
    GetSafParameterFailed,

    /// Internal failure, including abandoned and panicked calls.
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_else(|_| "UNKNOWN".to_owned());
        write!(f, "{}", s.trim_matches('"'))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Method error
// ─────────────────────────────────────────────────────────────────────────────

/// Error a method call resolves with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for MethodError {}

impl MethodError {
    /// Create a method error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// `sessionId` missing or malformed.
    #[must_use]
    pub fn invalid_session() -> Self {
        Self::new(ErrorCode::InvalidSession, "Invalid session id.")
    }

    /// `arguments` missing or malformed.
    #[must_use]
    pub fn invalid_arguments() -> Self {
        Self::new(ErrorCode::InvalidArguments, "Invalid arguments array.")
    }

    /// No session with the given id.
    #[must_use]
    pub fn session_not_found() -> Self {
        Self::new(ErrorCode::SessionNotFound, "Session not found.")
    }

    /// Session found but of the wrong kind.
    #[must_use]
    pub fn wrong_session_kind(expected: SessionKind) -> Self {
        let code = match expected {
            SessionKind::FFmpeg => ErrorCode::NotFfmpegSession,
            SessionKind::FFprobe => ErrorCode::NotFfprobeSession,
            SessionKind::MediaInformation => ErrorCode::NotMediaInformationSession,
        };
        Self::new(
            code,
            "A session is found but it does not have the correct type.",
        )
    }

    /// Unsupported signal number.
    #[must_use]
    pub fn unsupported_signal() -> Self {
        Self::new(ErrorCode::InvalidSignal, "Signal value not supported.")
    }

    /// Internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<ToolkitError> for MethodError {
    fn from(err: ToolkitError) -> Self {
        match err {
            ToolkitError::SessionNotFound(_) => Self::session_not_found(),
            ToolkitError::WrongSessionKind { expected, .. } => Self::wrong_session_kind(expected),
            ToolkitError::InvalidHistorySize(_) => {
                Self::new(ErrorCode::InvalidSize, "Invalid session history size value.")
            }
            ToolkitError::MediaInformationParse(msg) => Self::new(ErrorCode::ParseFailed, msg),
            ToolkitError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SessionId;
    use serde_json::json;

    // ── Codes ───────────────────────────────────────────────────────

    #[test]
    fn codes_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::SessionNotFound).unwrap(),
            "\"SESSION_NOT_FOUND\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::InvalidLogRedirectionStrategy).unwrap(),
            "\"INVALID_LOG_REDIRECTION_STRATEGY\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::GetSafParameterFailed).unwrap(),
            "\"GET_SAF_PARAMETER_FAILED\""
        );
    }

    #[test]
    fn irregular_names_keep_toolkit_spelling() {
        assert_eq!(ErrorCode::InvalidFfprobeJsonOutput.to_string(), "INVALID_FFPROBE_JSON_OUTPUT");
        assert_eq!(ErrorCode::NotFfmpegSession.to_string(), "NOT_FFMPEG_SESSION");
        assert_eq!(ErrorCode::NotFfprobeSession.to_string(), "NOT_FFPROBE_SESSION");
        assert_eq!(
            ErrorCode::NotMediaInformationSession.to_string(),
            "NOT_MEDIA_INFORMATION_SESSION"
        );
    }

    #[test]
    fn codes_deserialize() {
        let code: ErrorCode = serde_json::from_str("\"SELECT_CANCELLED\"").unwrap();
        assert_eq!(code, ErrorCode::SelectCancelled);
    }

    // ── Method errors ───────────────────────────────────────────────

    #[test]
    fn display_has_code_and_message() {
        let err = MethodError::session_not_found();
        assert_eq!(err.to_string(), "[SESSION_NOT_FOUND] Session not found.");
    }

    #[test]
    fn details_are_omitted_when_absent() {
        let v = serde_json::to_value(MethodError::invalid_session()).unwrap();
        assert_eq!(v, json!({"code": "INVALID_SESSION", "message": "Invalid session id."}));

        let v = serde_json::to_value(MethodError::internal("x").with_details(json!({"a": 1}))).unwrap();
        assert_eq!(v["details"]["a"], 1);
    }

    #[test]
    fn toolkit_errors_map_to_codes() {
        let cases = [
            (ToolkitError::SessionNotFound(SessionId::new(1)), ErrorCode::SessionNotFound),
            (
                ToolkitError::wrong_kind(SessionId::new(1), SessionKind::FFmpeg, SessionKind::FFprobe),
                ErrorCode::NotFfmpegSession,
            ),
            (
                ToolkitError::wrong_kind(SessionId::new(1), SessionKind::FFprobe, SessionKind::FFmpeg),
                ErrorCode::NotFfprobeSession,
            ),
            (
                ToolkitError::wrong_kind(
                    SessionId::new(1),
                    SessionKind::MediaInformation,
                    SessionKind::FFmpeg,
                ),
                ErrorCode::NotMediaInformationSession,
            ),
            (ToolkitError::InvalidHistorySize(0), ErrorCode::InvalidSize),
            (ToolkitError::MediaInformationParse("eof".into()), ErrorCode::ParseFailed),
            (ToolkitError::Internal("boom".into()), ErrorCode::InternalError),
        ];
        for (err, code) in cases {
            assert_eq!(MethodError::from(err).code, code);
        }
    }
}
