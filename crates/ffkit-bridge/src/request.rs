//! Typed decoding of method-channel invocations.
//!
//! [`Request::decode`] turns a method name and argument bag into a
//! [`Request`] before any handler runs. Arguments that are present with the
//! wrong JSON type are treated as missing.

use std::collections::HashMap;

use ffkit_core::{
    ErrorCode, Level, LogRedirectionStrategy, MethodError, SessionId, SessionKind, SessionState,
    Signal,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::platform::DocumentRequest;

/// A raw call from the UI layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Method name.
    pub method: String,
    /// Argument bag.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl Invocation {
    /// Invocation with arguments taken from a JSON object (anything else
    /// means no arguments).
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments: match arguments {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

/// Why an invocation did not decode.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    /// No such method.
    Unknown,
    /// A required argument is missing or malformed.
    Invalid(MethodError),
}

/// A decoded call.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    // ── Session introspection ──
    /// `abstractSessionGetEndTime`
    SessionEndTime(SessionId),
    /// `abstractSessionGetDuration`
    SessionDuration(SessionId),
    /// `abstractSessionGetAllLogs`
    SessionAllLogs {
        /// Session.
        id: SessionId,
        /// Requested wait, in milliseconds.
        wait_timeout: Option<i64>,
    },
    /// `abstractSessionGetLogs`
    SessionLogs(SessionId),
    /// `abstractSessionGetAllLogsAsString`
    SessionAllLogsAsString {
        /// Session.
        id: SessionId,
        /// Requested wait, in milliseconds.
        wait_timeout: Option<i64>,
    },
    /// `abstractSessionGetState`
    SessionState(SessionId),
    /// `abstractSessionGetReturnCode`
    SessionReturnCode(SessionId),
    /// `abstractSessionGetFailStackTrace`
    SessionFailStackTrace(SessionId),
    /// `thereAreAsynchronousMessagesInTransmit`
    HasMessagesInTransmit(SessionId),
    /// `messagesInTransmit`
    MessagesInTransmit(SessionId),

    // ── Session creation ──
    /// `ffmpegSession`, `ffprobeSession`, `mediaInformationSession`
    CreateSession {
        /// Kind to create.
        kind: SessionKind,
        /// Command-line arguments.
        arguments: Vec<String>,
    },

    // ── Statistics and media information ──
    /// `ffmpegSessionGetAllStatistics`
    AllStatistics {
        /// Session.
        id: SessionId,
        /// Requested wait, in milliseconds.
        wait_timeout: Option<i64>,
    },
    /// `ffmpegSessionGetStatistics`
    Statistics(SessionId),
    /// `getMediaInformation`
    MediaInformation(SessionId),
    /// `mediaInformationJsonParserFrom` / `...WithError`
    ParseMediaInformation {
        /// ffprobe JSON output.
        output: String,
        /// Report parse failures as errors instead of `null`.
        with_error: bool,
    },

    // ── Output routing ──
    /// `enableRedirection`
    EnableRedirection,
    /// `disableRedirection`
    DisableRedirection,
    /// `enableLogs`
    EnableLogs,
    /// `disableLogs`
    DisableLogs,
    /// `enableStatistics`
    EnableStatistics,
    /// `disableStatistics`
    DisableStatistics,

    // ── Fonts, pipes, environment ──
    /// `setFontconfigConfigurationPath`
    SetFontconfigConfigurationPath(String),
    /// `setFontDirectory` / `setFontDirectoryList`
    SetFontDirectories {
        /// Font directories.
        directories: Vec<String>,
        /// Family-name aliases.
        name_mapping: HashMap<String, String>,
    },
    /// `registerNewFFmpegPipe`
    RegisterNewPipe,
    /// `closeFFmpegPipe`
    ClosePipe(String),
    /// `setEnvironmentVariable`
    SetEnvironmentVariable {
        /// Variable name.
        name: String,
        /// Variable value.
        value: String,
    },
    /// `ignoreSignal`
    IgnoreSignal(Signal),

    // ── Execution ──
    /// `ffmpegSessionExecute`, `ffprobeSessionExecute`, `mediaInformationSessionExecute`
    Execute {
        /// Session.
        id: SessionId,
        /// Kind the session must have.
        kind: SessionKind,
        /// Requested wait for trailing output, in milliseconds.
        wait_timeout: Option<i64>,
    },
    /// `asyncFFmpegSessionExecute` and friends.
    ExecuteAsync {
        /// Session.
        id: SessionId,
        /// Kind the session must have.
        kind: SessionKind,
        /// Requested wait for trailing output, in milliseconds.
        wait_timeout: Option<i64>,
    },
    /// `cancel`
    CancelAll,
    /// `cancelSession`
    CancelSession(SessionId),

    // ── Configuration ──
    /// `getLogLevel`
    LogLevel,
    /// `setLogLevel`
    SetLogLevel(Level),
    /// `getSessionHistorySize`
    SessionHistorySize,
    /// `setSessionHistorySize`
    SetSessionHistorySize(i64),
    /// `getLogRedirectionStrategy`
    LogRedirectionStrategy,
    /// `setLogRedirectionStrategy`
    SetLogRedirectionStrategy(LogRedirectionStrategy),

    // ── Session queries ──
    /// `getSession`
    Session(SessionId),
    /// `getLastSession`
    LastSession,
    /// `getLastCompletedSession`
    LastCompletedSession,
    /// `getSessions`
    Sessions,
    /// `clearSessions`
    ClearSessions,
    /// `getSessionsByState`
    SessionsByState(SessionState),
    /// `getFFmpegSessions`, `getFFprobeSessions`, `getMediaInformationSessions`
    SessionsByKind(SessionKind),

    // ── Metadata ──
    /// `getArch`
    Arch,
    /// `getFFmpegVersion`
    Version,
    /// `isLTSBuild`
    IsLtsBuild,
    /// `getBuildDate`
    BuildDate,
    /// `getPackageName`
    PackageName,
    /// `getExternalLibraries`
    ExternalLibraries,
    /// `getPlatform`
    Platform,

    // ── Platform ──
    /// `writeToPipe`
    WriteToPipe {
        /// File to copy from.
        input: String,
        /// Pipe to copy into.
        pipe: String,
    },
    /// `selectDocument`
    SelectDocument(DocumentRequest),
    /// `getSafParameter`
    SafParameter {
        /// Document URI.
        uri: String,
        /// Open mode (`r`, `w`, `rw`, ...).
        open_mode: String,
    },
}

/// Typed view over an argument bag.
struct Args<'a>(&'a Map<String, Value>);

impl Args<'_> {
    fn int(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    fn strings(&self, key: &str) -> Option<Vec<String>> {
        self.0
            .get(key)?
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    fn string_map(&self, key: &str) -> Option<HashMap<String, String>> {
        self.0
            .get(key)?
            .as_object()?
            .iter()
            .map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect()
    }

    fn session_id(&self) -> Result<SessionId, Rejection> {
        self.int("sessionId")
            .map(SessionId::new)
            .ok_or_else(|| Rejection::Invalid(MethodError::invalid_session()))
    }

    fn wait_timeout(&self) -> Option<i64> {
        self.int("waitTimeout")
    }
}

fn invalid(code: ErrorCode, message: &str) -> Rejection {
    Rejection::Invalid(MethodError::new(code, message))
}

impl Request {
    /// Decode an invocation.
    pub fn decode(invocation: &Invocation) -> Result<Self, Rejection> {
        let args = Args(&invocation.arguments);

        let request = match invocation.method.as_str() {
            "abstractSessionGetEndTime" => Self::SessionEndTime(args.session_id()?),
            "abstractSessionGetDuration" => Self::SessionDuration(args.session_id()?),
            "abstractSessionGetAllLogs" => Self::SessionAllLogs {
                id: args.session_id()?,
                wait_timeout: args.wait_timeout(),
            },
            "abstractSessionGetLogs" => Self::SessionLogs(args.session_id()?),
            "abstractSessionGetAllLogsAsString" => Self::SessionAllLogsAsString {
                id: args.session_id()?,
                wait_timeout: args.wait_timeout(),
            },
            "abstractSessionGetState" => Self::SessionState(args.session_id()?),
            "abstractSessionGetReturnCode" => Self::SessionReturnCode(args.session_id()?),
            "abstractSessionGetFailStackTrace" => Self::SessionFailStackTrace(args.session_id()?),
            "thereAreAsynchronousMessagesInTransmit" => {
                Self::HasMessagesInTransmit(args.session_id()?)
            }
            "messagesInTransmit" => Self::MessagesInTransmit(args.session_id()?),

            "ffmpegSession" => create(&args, SessionKind::FFmpeg)?,
            "ffprobeSession" => create(&args, SessionKind::FFprobe)?,
            "mediaInformationSession" => create(&args, SessionKind::MediaInformation)?,

            "ffmpegSessionGetAllStatistics" => Self::AllStatistics {
                id: args.session_id()?,
                wait_timeout: args.wait_timeout(),
            },
            "ffmpegSessionGetStatistics" => Self::Statistics(args.session_id()?),
            "getMediaInformation" => Self::MediaInformation(args.session_id()?),
            "mediaInformationJsonParserFrom" => parse_media(&args, false)?,
            "mediaInformationJsonParserFromWithError" => parse_media(&args, true)?,

            "enableRedirection" => Self::EnableRedirection,
            "disableRedirection" => Self::DisableRedirection,
            "enableLogs" => Self::EnableLogs,
            "disableLogs" => Self::DisableLogs,
            "enableStatistics" => Self::EnableStatistics,
            "disableStatistics" => Self::DisableStatistics,

            "setFontconfigConfigurationPath" => Self::SetFontconfigConfigurationPath(
                args.string("path")
                    .ok_or_else(|| invalid(ErrorCode::InvalidPath, "Invalid path."))?,
            ),
            "setFontDirectory" => Self::SetFontDirectories {
                directories: vec![args.string("fontDirectory").ok_or_else(|| {
                    invalid(ErrorCode::InvalidFontDirectory, "Invalid font directory.")
                })?],
                name_mapping: args.string_map("fontNameMap").unwrap_or_default(),
            },
            "setFontDirectoryList" => Self::SetFontDirectories {
                directories: args.strings("fontDirectoryList").ok_or_else(|| {
                    invalid(ErrorCode::InvalidFontDirectoryList, "Invalid font directory list.")
                })?,
                name_mapping: args.string_map("fontNameMap").unwrap_or_default(),
            },
            "registerNewFFmpegPipe" => Self::RegisterNewPipe,
            "closeFFmpegPipe" => Self::ClosePipe(
                args.string("ffmpegPipePath")
                    .ok_or_else(|| invalid(ErrorCode::InvalidPipePath, "Invalid ffmpeg pipe path."))?,
            ),
            "setEnvironmentVariable" => {
                match (args.string("variableName"), args.string("variableValue")) {
                    (Some(name), Some(value)) => Self::SetEnvironmentVariable { name, value },
                    (None, Some(_)) => {
                        return Err(invalid(ErrorCode::InvalidName, "Invalid environment variable name."));
                    }
                    _ => {
                        return Err(invalid(ErrorCode::InvalidValue, "Invalid environment variable value."));
                    }
                }
            }
            "ignoreSignal" => {
                let value = args
                    .int("signal")
                    .ok_or_else(|| invalid(ErrorCode::InvalidSignal, "Invalid signal value."))?;
                Self::IgnoreSignal(
                    Signal::from_value(value)
                        .ok_or_else(|| Rejection::Invalid(MethodError::unsupported_signal()))?,
                )
            }

            "ffmpegSessionExecute" => execute(&args, SessionKind::FFmpeg, false)?,
            "ffprobeSessionExecute" => execute(&args, SessionKind::FFprobe, false)?,
            "mediaInformationSessionExecute" => execute(&args, SessionKind::MediaInformation, false)?,
            "asyncFFmpegSessionExecute" => execute(&args, SessionKind::FFmpeg, true)?,
            "asyncFFprobeSessionExecute" => execute(&args, SessionKind::FFprobe, true)?,
            "asyncMediaInformationSessionExecute" => {
                execute(&args, SessionKind::MediaInformation, true)?
            }
            "cancel" => Self::CancelAll,
            "cancelSession" => Self::CancelSession(args.session_id()?),

            "getLogLevel" => Self::LogLevel,
            "setLogLevel" => Self::SetLogLevel(
                args.int("level")
                    .and_then(Level::from_value)
                    .ok_or_else(|| invalid(ErrorCode::InvalidLevel, "Invalid level value."))?,
            ),
            "getSessionHistorySize" => Self::SessionHistorySize,
            "setSessionHistorySize" => Self::SetSessionHistorySize(args.int("sessionHistorySize").ok_or_else(
                || invalid(ErrorCode::InvalidSize, "Invalid session history size value."),
            )?),
            "getLogRedirectionStrategy" => Self::LogRedirectionStrategy,
            "setLogRedirectionStrategy" => Self::SetLogRedirectionStrategy(
                args.int("strategy")
                    .and_then(LogRedirectionStrategy::from_ordinal)
                    .ok_or_else(|| {
                        invalid(
                            ErrorCode::InvalidLogRedirectionStrategy,
                            "Invalid log redirection strategy value.",
                        )
                    })?,
            ),

            "getSession" => Self::Session(args.session_id()?),
            "getLastSession" => Self::LastSession,
            "getLastCompletedSession" => Self::LastCompletedSession,
            "getSessions" => Self::Sessions,
            "clearSessions" => Self::ClearSessions,
            "getSessionsByState" => Self::SessionsByState(
                args.int("state")
                    .and_then(SessionState::from_ordinal)
                    .ok_or_else(|| invalid(ErrorCode::InvalidSessionState, "Invalid session state value."))?,
            ),
            "getFFmpegSessions" => Self::SessionsByKind(SessionKind::FFmpeg),
            "getFFprobeSessions" => Self::SessionsByKind(SessionKind::FFprobe),
            "getMediaInformationSessions" => Self::SessionsByKind(SessionKind::MediaInformation),

            "getArch" => Self::Arch,
            "getFFmpegVersion" => Self::Version,
            "isLTSBuild" => Self::IsLtsBuild,
            "getBuildDate" => Self::BuildDate,
            "getPackageName" => Self::PackageName,
            "getExternalLibraries" => Self::ExternalLibraries,
            "getPlatform" => Self::Platform,

            "writeToPipe" => match (args.string("input"), args.string("pipe")) {
                (Some(input), Some(pipe)) => Self::WriteToPipe { input, pipe },
                (None, Some(_)) => return Err(invalid(ErrorCode::InvalidInput, "Invalid input value.")),
                _ => return Err(invalid(ErrorCode::InvalidPipe, "Invalid pipe value.")),
            },
            "selectDocument" => Self::SelectDocument(DocumentRequest {
                writable: args
                    .boolean("writable")
                    .ok_or_else(|| invalid(ErrorCode::InvalidWritable, "Invalid writable value."))?,
                title: args.string("title"),
                mime_type: args.string("type"),
                extra_types: args.strings("extraTypes").unwrap_or_default(),
            }),
            "getSafParameter" => match (args.string("uri"), args.string("openMode")) {
                (Some(uri), Some(open_mode)) => Self::SafParameter { uri, open_mode },
                (Some(_), None) => {
                    return Err(invalid(ErrorCode::InvalidOpenMode, "Invalid openMode value."));
                }
                _ => return Err(invalid(ErrorCode::InvalidUri, "Invalid uri value.")),
            },

            _ => return Err(Rejection::Unknown),
        };

        Ok(request)
    }

    /// Whether the call may block and must run on the execution pool.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::SessionAllLogs { .. }
                | Self::SessionAllLogsAsString { .. }
                | Self::AllStatistics { .. }
                | Self::Execute { .. }
                | Self::WriteToPipe { .. }
        )
    }
}

fn create(args: &Args<'_>, kind: SessionKind) -> Result<Request, Rejection> {
    let arguments = args
        .strings("arguments")
        .ok_or_else(|| Rejection::Invalid(MethodError::invalid_arguments()))?;
    Ok(Request::CreateSession { kind, arguments })
}

fn parse_media(args: &Args<'_>, with_error: bool) -> Result<Request, Rejection> {
    let output = args.string("ffprobeJsonOutput").ok_or_else(|| {
        invalid(ErrorCode::InvalidFfprobeJsonOutput, "Invalid ffprobe json output.")
    })?;
    Ok(Request::ParseMediaInformation { output, with_error })
}

fn execute(args: &Args<'_>, kind: SessionKind, asynchronous: bool) -> Result<Request, Rejection> {
    let id = args.session_id()?;
    let wait_timeout = args.wait_timeout();
    Ok(if asynchronous {
        Request::ExecuteAsync { id, kind, wait_timeout }
    } else {
        Request::Execute { id, kind, wait_timeout }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn decode(method: &str, arguments: Value) -> Result<Request, Rejection> {
        Request::decode(&Invocation::new(method, arguments))
    }

    fn code_of(result: Result<Request, Rejection>) -> ErrorCode {
        match result {
            Err(Rejection::Invalid(e)) => e.code,
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    // ── Unknown methods ─────────────────────────────────────────────

    #[test]
    fn unknown_method_is_rejected_as_unknown() {
        assert_eq!(decode("frobnicate", json!({})), Err(Rejection::Unknown));
    }

    // ── Session ids ─────────────────────────────────────────────────

    #[test]
    fn session_id_required() {
        for method in [
            "abstractSessionGetEndTime",
            "abstractSessionGetDuration",
            "abstractSessionGetAllLogs",
            "abstractSessionGetLogs",
            "abstractSessionGetAllLogsAsString",
            "abstractSessionGetState",
            "abstractSessionGetReturnCode",
            "abstractSessionGetFailStackTrace",
            "thereAreAsynchronousMessagesInTransmit",
            "ffmpegSessionGetAllStatistics",
            "ffmpegSessionGetStatistics",
            "getMediaInformation",
            "ffmpegSessionExecute",
            "asyncMediaInformationSessionExecute",
            "getSession",
            "messagesInTransmit",
            "cancelSession",
        ] {
            assert_eq!(code_of(decode(method, json!({}))), ErrorCode::InvalidSession, "{method}");
        }
    }

    #[test]
    fn wrong_typed_session_id_counts_as_missing() {
        let err = decode("abstractSessionGetState", json!({"sessionId": "7"}));
        assert_eq!(code_of(err), ErrorCode::InvalidSession);
    }

    #[test]
    fn wait_timeout_is_optional() {
        assert_eq!(
            decode("abstractSessionGetAllLogs", json!({"sessionId": 3, "waitTimeout": 250})),
            Ok(Request::SessionAllLogs { id: SessionId::new(3), wait_timeout: Some(250) })
        );
        assert_eq!(
            decode("ffmpegSessionGetAllStatistics", json!({"sessionId": 3, "waitTimeout": "x"})),
            Ok(Request::AllStatistics { id: SessionId::new(3), wait_timeout: None })
        );
    }

    // ── Creation ────────────────────────────────────────────────────

    #[test]
    fn create_session_requires_string_array() {
        assert_eq!(
            decode("ffmpegSession", json!({"arguments": ["-i", "in.mp4", "out.mp4"]})),
            Ok(Request::CreateSession {
                kind: SessionKind::FFmpeg,
                arguments: vec!["-i".into(), "in.mp4".into(), "out.mp4".into()],
            })
        );
        assert_eq!(code_of(decode("ffprobeSession", json!({}))), ErrorCode::InvalidArguments);
        assert_eq!(
            code_of(decode("mediaInformationSession", json!({"arguments": ["-i", 3]}))),
            ErrorCode::InvalidArguments
        );
    }

    // ── Argument-specific errors ────────────────────────────────────

    #[test]
    fn missing_argument_codes() {
        let cases = [
            ("mediaInformationJsonParserFrom", ErrorCode::InvalidFfprobeJsonOutput),
            ("mediaInformationJsonParserFromWithError", ErrorCode::InvalidFfprobeJsonOutput),
            ("setFontconfigConfigurationPath", ErrorCode::InvalidPath),
            ("setFontDirectory", ErrorCode::InvalidFontDirectory),
            ("setFontDirectoryList", ErrorCode::InvalidFontDirectoryList),
            ("closeFFmpegPipe", ErrorCode::InvalidPipePath),
            ("ignoreSignal", ErrorCode::InvalidSignal),
            ("setLogLevel", ErrorCode::InvalidLevel),
            ("setSessionHistorySize", ErrorCode::InvalidSize),
            ("getSessionsByState", ErrorCode::InvalidSessionState),
            ("setLogRedirectionStrategy", ErrorCode::InvalidLogRedirectionStrategy),
            ("selectDocument", ErrorCode::InvalidWritable),
        ];
        for (method, code) in cases {
            assert_eq!(code_of(decode(method, json!({}))), code, "{method}");
        }
    }

    #[test]
    fn environment_variable_errors_depend_on_which_is_missing() {
        assert_eq!(
            code_of(decode("setEnvironmentVariable", json!({"variableValue": "1"}))),
            ErrorCode::InvalidName
        );
        assert_eq!(
            code_of(decode("setEnvironmentVariable", json!({"variableName": "A"}))),
            ErrorCode::InvalidValue
        );
        assert_eq!(code_of(decode("setEnvironmentVariable", json!({}))), ErrorCode::InvalidValue);
    }

    #[test]
    fn pipe_write_errors_depend_on_which_is_missing() {
        assert_eq!(code_of(decode("writeToPipe", json!({"pipe": "/p"}))), ErrorCode::InvalidInput);
        assert_eq!(code_of(decode("writeToPipe", json!({"input": "/i"}))), ErrorCode::InvalidPipe);
        assert_eq!(code_of(decode("writeToPipe", json!({}))), ErrorCode::InvalidPipe);
    }

    #[test]
    fn saf_parameter_errors_depend_on_which_is_missing() {
        assert_eq!(
            code_of(decode("getSafParameter", json!({"uri": "content://x"}))),
            ErrorCode::InvalidOpenMode
        );
        assert_eq!(code_of(decode("getSafParameter", json!({"openMode": "r"}))), ErrorCode::InvalidUri);
    }

    // ── Enumerated values ───────────────────────────────────────────

    #[test]
    fn signals_outside_the_supported_set_are_rejected() {
        assert_eq!(decode("ignoreSignal", json!({"signal": 13})), Ok(Request::IgnoreSignal(Signal::Sigpipe)));
        let err = decode("ignoreSignal", json!({"signal": 9}));
        assert_matches!(err, Err(Rejection::Invalid(e)) if e.message == "Signal value not supported.");
    }

    #[test]
    fn enumerated_values_are_validated() {
        assert_eq!(decode("setLogLevel", json!({"level": 48})), Ok(Request::SetLogLevel(Level::AvLogDebug)));
        assert_eq!(code_of(decode("setLogLevel", json!({"level": 47}))), ErrorCode::InvalidLevel);
        assert_eq!(
            decode("getSessionsByState", json!({"state": 3})),
            Ok(Request::SessionsByState(SessionState::Completed))
        );
        assert_eq!(code_of(decode("getSessionsByState", json!({"state": 4}))), ErrorCode::InvalidSessionState);
        assert_eq!(
            code_of(decode("setLogRedirectionStrategy", json!({"strategy": 5}))),
            ErrorCode::InvalidLogRedirectionStrategy
        );
    }

    // ── Optional arguments ──────────────────────────────────────────

    #[test]
    fn font_directories_with_optional_mapping() {
        assert_eq!(
            decode("setFontDirectory", json!({"fontDirectory": "/fonts"})),
            Ok(Request::SetFontDirectories { directories: vec!["/fonts".into()], name_mapping: HashMap::new() })
        );
        let decoded = decode(
            "setFontDirectoryList",
            json!({"fontDirectoryList": ["/a", "/b"], "fontNameMap": {"MyFont": "Doppio One"}}),
        )
        .unwrap();
        assert_matches!(decoded, Request::SetFontDirectories { directories, name_mapping }
            if directories.len() == 2 && name_mapping["MyFont"] == "Doppio One");
    }

    #[test]
    fn select_document_optional_fields() {
        let decoded = decode(
            "selectDocument",
            json!({"writable": true, "title": "out.mp4", "type": "video/*", "extraTypes": ["audio/*"]}),
        )
        .unwrap();
        assert_eq!(
            decoded,
            Request::SelectDocument(DocumentRequest {
                writable: true,
                title: Some("out.mp4".into()),
                mime_type: Some("video/*".into()),
                extra_types: vec!["audio/*".into()],
            })
        );
    }

    // ── Routing ─────────────────────────────────────────────────────

    #[test]
    fn blocking_calls() {
        let id = json!({"sessionId": 1});
        assert!(decode("ffmpegSessionExecute", id.clone()).unwrap().is_blocking());
        assert!(decode("abstractSessionGetAllLogsAsString", id.clone()).unwrap().is_blocking());
        assert!(!decode("asyncFFmpegSessionExecute", id.clone()).unwrap().is_blocking());
        assert!(!decode("abstractSessionGetState", id).unwrap().is_blocking());
        assert!(decode("writeToPipe", json!({"input": "/i", "pipe": "/p"})).unwrap().is_blocking());
    }

    #[test]
    fn invocation_deserializes_without_arguments() {
        let inv: Invocation = serde_json::from_str(r#"{"method":"getArch"}"#).unwrap();
        assert_eq!(inv.method, "getArch");
        assert!(inv.arguments.is_empty());
        assert_eq!(Request::decode(&inv), Ok(Request::Arch));
    }
}
