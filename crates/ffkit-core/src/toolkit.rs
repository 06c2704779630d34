//! The toolkit seam.
//!
//! The bridge never owns sessions. It commands and queries a [`Toolkit`] by
//! session id, and receives pushed events through a [`ToolkitCallbacks`]
//! capability it registers on attach and clears on detach.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ToolkitError;
use crate::ids::SessionId;
use crate::log::{Level, Log, LogRedirectionStrategy};
use crate::session::{Session, SessionKind, SessionState};
use crate::signal::Signal;
use crate::statistics::Statistics;

/// Receiver of events the toolkit emits while sessions run.
///
/// Implementations must not block: the toolkit calls these from its output
/// readers.
pub trait ToolkitCallbacks: Send + Sync {
    /// A log line was captured.
    fn on_log(&self, log: &Log);

    /// A statistics sample was captured.
    fn on_statistics(&self, statistics: &Statistics);

    /// A session reached a terminal state.
    fn on_session_complete(&self, session: &Session);
}

/// Session registry and configuration surface of the media toolkit.
#[async_trait]
pub trait Toolkit: Send + Sync {
    // ── Sessions ────────────────────────────────────────────────────

    /// Create and register a session without running it.
    fn create_session(
        &self,
        kind: SessionKind,
        arguments: Vec<String>,
        log_redirection_strategy: LogRedirectionStrategy,
    ) -> Session;

    /// Snapshot of one session.
    fn session(&self, id: SessionId) -> Result<Session, ToolkitError>;

    /// Most recently created session.
    fn last_session(&self) -> Option<Session>;

    /// Most recently created session that has completed.
    fn last_completed_session(&self) -> Option<Session>;

    /// Every session in history, oldest first.
    fn sessions(&self) -> Vec<Session>;

    /// Sessions of one kind, oldest first.
    fn sessions_by_kind(&self, kind: SessionKind) -> Vec<Session>;

    /// Sessions in one state, oldest first.
    fn sessions_by_state(&self, state: SessionState) -> Vec<Session>;

    /// Forget every session.
    fn clear_sessions(&self);

    // ── Execution ───────────────────────────────────────────────────

    /// Run a session to completion.
    ///
    /// `wait_timeout` bounds how long to wait for output still being
    /// delivered after the process exits.
    async fn execute(
        &self,
        id: SessionId,
        expected: SessionKind,
        wait_timeout: Duration,
    ) -> Result<(), ToolkitError>;

    /// Start a session in the background and return at once. Completion is
    /// reported through [`ToolkitCallbacks::on_session_complete`].
    fn execute_async(
        &self,
        id: SessionId,
        expected: SessionKind,
        wait_timeout: Duration,
    ) -> Result<(), ToolkitError>;

    /// Cancel one running session, or all of them when `id` is `None`.
    fn cancel(&self, id: Option<SessionId>);

    /// Number of output streams of the session still being delivered.
    fn messages_in_transmit(&self, id: SessionId) -> usize;

    /// Wait until the session has no output in transmit, or the timeout
    /// elapses.
    async fn wait_for_messages(&self, id: SessionId, timeout: Duration);

    // ── Configuration ───────────────────────────────────────────────

    /// Current log level.
    fn log_level(&self) -> Level;

    /// Set the log level used for new runs.
    fn set_log_level(&self, level: Level);

    /// Print captured log lines according to each session's strategy.
    fn enable_redirection(&self);

    /// Never print captured log lines.
    fn disable_redirection(&self);

    /// Default strategy for new sessions.
    fn log_redirection_strategy(&self) -> LogRedirectionStrategy;

    /// Set the default strategy for new sessions.
    fn set_log_redirection_strategy(&self, strategy: LogRedirectionStrategy);

    /// Maximum number of sessions kept in history.
    fn session_history_size(&self) -> usize;

    /// Set the history bound; evicts the oldest sessions beyond it.
    fn set_session_history_size(&self, size: i64) -> Result<(), ToolkitError>;

    /// Point fontconfig at a configuration file.
    fn set_fontconfig_configuration_path(&self, path: &str);

    /// Register font directories, with optional family-name aliases.
    fn set_font_directories(&self, directories: Vec<String>, name_mapping: HashMap<String, String>);

    /// Create a new named pipe and return its path.
    async fn register_new_pipe(&self) -> Option<String>;

    /// Remove a named pipe.
    async fn close_pipe(&self, path: &str);

    /// Set an environment variable for executed sessions.
    fn set_environment_variable(&self, name: &str, value: &str);

    /// Disable the default handler of a signal.
    fn ignore_signal(&self, signal: Signal);

    // ── Metadata ────────────────────────────────────────────────────

    /// Toolkit version string.
    async fn version(&self) -> String;

    /// Whether this is a long-term-support build.
    fn is_lts_build(&self) -> bool;

    /// Build date as `yyyyMMdd`.
    async fn build_date(&self) -> String;

    /// Toolkit package name.
    fn package_name(&self) -> String;

    /// External libraries compiled into the toolkit.
    async fn external_libraries(&self) -> Vec<String>;

    /// CPU architecture the toolkit runs on.
    fn arch(&self) -> String;

    // ── Callbacks ───────────────────────────────────────────────────

    /// Register (or with `None`, clear) the event receiver.
    fn set_callbacks(&self, callbacks: Option<Arc<dyn ToolkitCallbacks>>);
}
