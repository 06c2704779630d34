//! [`NativeToolkit`]: the [`Toolkit`] implementation backed by executables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ffkit_core::constants::{DEFAULT_ASYNC_CONCURRENCY_LIMIT, SESSION_HISTORY_HARD_LIMIT};
use ffkit_core::{
    Level, Log, LogRedirectionStrategy, MediaInformation, ReturnCode, Session, SessionId,
    SessionKind, SessionState, Signal, Statistics, Toolkit, ToolkitCallbacks, ToolkitError,
};
use ffkit_settings::FfkitSettings;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{watch, OnceCell, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{fonts_conf_path, render_fonts_conf, FontConfig, ToolkitConfig};
use crate::errors::RuntimeError;
use crate::metadata::VersionInfo;
use crate::parse::{parse_log_line, ProgressParser};
use crate::process::{OutputSink, OutputStream, ProcessExit, ProcessRunner, ProcessSpec};
use crate::registry::SessionRegistry;

/// Static options for a [`NativeToolkit`].
#[derive(Clone, Debug)]
pub struct NativeToolkitOptions {
    /// `ffmpeg` executable.
    pub ffmpeg_path: String,
    /// `ffprobe` executable.
    pub ffprobe_path: String,
    /// Initial history bound.
    pub session_history_size: usize,
    /// Initial log level.
    pub log_level: Level,
    /// Directory named pipes are created in.
    pub pipe_directory: PathBuf,
    /// Directory the generated `fonts.conf` is written to.
    pub fontconfig_directory: PathBuf,
    /// Package name reported to callers.
    pub package_name: String,
    /// Asynchronous executions running at once; the rest wait in order.
    pub async_concurrency_limit: usize,
}

impl Default for NativeToolkitOptions {
    fn default() -> Self {
        Self::from_settings(&FfkitSettings::default())
    }
}

impl NativeToolkitOptions {
    /// Options from the toolkit and bridge settings sections.
    pub fn from_settings(settings: &FfkitSettings) -> Self {
        let limit = settings.bridge.async_concurrency_limit;
        let settings = &settings.toolkit;
        Self {
            ffmpeg_path: settings.ffmpeg_path.clone(),
            ffprobe_path: settings.ffprobe_path.clone(),
            session_history_size: settings.session_history_size,
            log_level: Level::from_value(settings.log_level).unwrap_or(Level::AvLogInfo),
            pipe_directory: settings.pipe_directory.clone(),
            fontconfig_directory: settings.fontconfig_directory.clone(),
            package_name: settings.package_name.clone(),
            async_concurrency_limit: if limit == 0 {
                DEFAULT_ASYNC_CONCURRENCY_LIMIT
            } else {
                limit
            },
        }
    }
}

struct Shared {
    runner: Arc<dyn ProcessRunner>,
    options: NativeToolkitOptions,
    registry: SessionRegistry,
    config: RwLock<ToolkitConfig>,
    callbacks: RwLock<Option<Arc<dyn ToolkitCallbacks>>>,
    next_session_id: AtomicI64,
    next_pipe_id: AtomicU64,
    version: OnceCell<VersionInfo>,
    async_permits: Arc<Semaphore>,
}

impl Shared {
    fn callbacks(&self) -> Option<Arc<dyn ToolkitCallbacks>> {
        self.callbacks.read().clone()
    }

    fn record_log(
        &self,
        id: SessionId,
        strategy: LogRedirectionStrategy,
        level: Option<Level>,
        message: &str,
    ) {
        let log = Log::new(id, level, format!("{message}\n"));
        let _ = self.registry.update(id, |s| s.logs.push(log.clone()));

        let callbacks = self.callbacks();
        let print = self
            .config
            .read()
            .should_print(strategy, level, callbacks.is_some());
        if print {
            print_toolkit_line(id, level, message);
        }
        if let Some(callbacks) = callbacks {
            callbacks.on_log(&log);
        }
    }

    fn record_statistics(&self, statistics: Statistics) {
        let _ = self
            .registry
            .update(statistics.session_id, |s| s.statistics.push(statistics.clone()));
        if let Some(callbacks) = self.callbacks() {
            callbacks.on_statistics(&statistics);
        }
    }
}

fn print_toolkit_line(id: SessionId, level: Option<Level>, message: &str) {
    match level.unwrap_or(Level::AvLogTrace) {
        Level::AvLogStderr
        | Level::AvLogQuiet
        | Level::AvLogPanic
        | Level::AvLogFatal
        | Level::AvLogError => tracing::error!(target: "ffkit::toolkit", session_id = %id, "{message}"),
        Level::AvLogWarning => tracing::warn!(target: "ffkit::toolkit", session_id = %id, "{message}"),
        Level::AvLogInfo => tracing::info!(target: "ffkit::toolkit", session_id = %id, "{message}"),
        Level::AvLogVerbose | Level::AvLogDebug => {
            tracing::debug!(target: "ffkit::toolkit", session_id = %id, "{message}");
        }
        Level::AvLogTrace => tracing::trace!(target: "ffkit::toolkit", session_id = %id, "{message}"),
    }
}

/// Output sink for one running session.
struct SessionSink {
    shared: Arc<Shared>,
    id: SessionId,
    kind: SessionKind,
    strategy: LogRedirectionStrategy,
    progress: Mutex<ProgressParser>,
    probe_output: Mutex<String>,
    transmit: Arc<watch::Sender<usize>>,
}

impl OutputSink for SessionSink {
    fn line(&self, stream: OutputStream, line: &str) {
        match (stream, self.kind) {
            (OutputStream::Stdout, SessionKind::FFmpeg) => {
                let sample = self.progress.lock().feed(line);
                if let Some(sample) = sample {
                    self.shared.record_statistics(sample);
                }
            }
            (OutputStream::Stdout, kind) => {
                if kind == SessionKind::MediaInformation {
                    let mut out = self.probe_output.lock();
                    out.push_str(line);
                    out.push('\n');
                }
                self.shared
                    .record_log(self.id, self.strategy, Some(Level::AvLogStderr), line);
            }
            (OutputStream::Stderr, _) => {
                let (level, message) = parse_log_line(line);
                self.shared.record_log(self.id, self.strategy, level, &message);
            }
        }
    }

    fn closed(&self, _stream: OutputStream) {
        self.transmit.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// A session validated and marked running, ready to drive.
struct PreparedRun {
    id: SessionId,
    kind: SessionKind,
    spec: ProcessSpec,
    cancel: CancellationToken,
    sink: Arc<SessionSink>,
    write_fonts: Option<String>,
}

/// Toolkit backed by the `ffmpeg` and `ffprobe` executables.
#[derive(Clone)]
pub struct NativeToolkit {
    shared: Arc<Shared>,
}

impl NativeToolkit {
    /// Create a toolkit that spawns processes through `runner`.
    pub fn new(options: NativeToolkitOptions, runner: Arc<dyn ProcessRunner>) -> Self {
        let config = ToolkitConfig::new(options.log_level);
        let registry = SessionRegistry::new(options.session_history_size);
        let async_permits = Arc::new(Semaphore::new(options.async_concurrency_limit.max(1)));
        Self {
            shared: Arc::new(Shared {
                runner,
                options,
                registry,
                config: RwLock::new(config),
                callbacks: RwLock::new(None),
                next_session_id: AtomicI64::new(1),
                next_pipe_id: AtomicU64::new(0),
                version: OnceCell::new(),
                async_permits,
            }),
        }
    }

    /// Signals recorded through [`Toolkit::ignore_signal`].
    pub fn ignored_signals(&self) -> Vec<Signal> {
        self.shared.config.read().ignored_signals.iter().copied().collect()
    }

    /// Environment variables recorded through
    /// [`Toolkit::set_environment_variable`].
    pub fn environment(&self) -> HashMap<String, String> {
        self.shared.config.read().environment.clone()
    }

    /// Whether captured lines may currently be printed.
    pub fn redirection_enabled(&self) -> bool {
        self.shared.config.read().redirection_enabled
    }

    /// Claim a session for a run. The session stays CREATED until the run
    /// actually starts.
    fn prepare(&self, id: SessionId, expected: SessionKind) -> Result<PreparedRun, ToolkitError> {
        let shared = &self.shared;
        let cancel = CancellationToken::new();
        let ((arguments, strategy), transmit) = shared
            .registry
            .begin(id, cancel.clone(), |s, in_flight| {
                if s.kind != expected {
                    return Err(ToolkitError::wrong_kind(id, expected, s.kind));
                }
                if in_flight || s.state != SessionState::Created {
                    let reason = if s.state.is_terminal() {
                        "has already been executed"
                    } else {
                        "is already queued or running"
                    };
                    return Err(ToolkitError::Internal(format!("session {id} {reason}")));
                }
                Ok((s.arguments.clone(), s.log_redirection_strategy))
            })
            .ok_or(ToolkitError::SessionNotFound(id))??;

        let config = shared.config.read();
        let level = format!("level+{}", config.log_level.cli_name());
        let (program, mut args) = if expected.is_probe() {
            (
                shared.options.ffprobe_path.clone(),
                vec!["-hide_banner".to_string(), "-loglevel".to_string(), level],
            )
        } else {
            (
                shared.options.ffmpeg_path.clone(),
                vec![
                    "-hide_banner".to_string(),
                    "-loglevel".to_string(),
                    level,
                    "-progress".to_string(),
                    "pipe:1".to_string(),
                    "-nostats".to_string(),
                ],
            )
        };
        args.extend(arguments);

        let spec = ProcessSpec {
            program,
            args,
            env: config.child_environment(&shared.options.fontconfig_directory),
            own_process_group: config.isolates_terminal_signals(),
        };
        let write_fonts = match &config.fonts {
            FontConfig::Directories {
                directories,
                name_mapping,
            } => Some(render_fonts_conf(directories, name_mapping)),
            _ => None,
        };
        drop(config);

        let sink = Arc::new(SessionSink {
            shared: Arc::clone(shared),
            id,
            kind: expected,
            strategy,
            progress: Mutex::new(ProgressParser::new(id)),
            probe_output: Mutex::new(String::new()),
            transmit,
        });

        Ok(PreparedRun {
            id,
            kind: expected,
            spec,
            cancel,
            sink,
            write_fonts,
        })
    }
}

#[instrument(skip_all, fields(session_id = %run.id, kind = ?run.kind))]
async fn drive(
    shared: Arc<Shared>,
    run: PreparedRun,
    wait_timeout: Duration,
    permits: Option<Arc<Semaphore>>,
) {
    let _permit = match permits {
        Some(permits) => {
            let acquired = tokio::select! {
                permit = permits.acquire_owned() => permit.ok(),
                () = run.cancel.cancelled() => None,
            };
            if acquired.is_none() {
                debug!("cancelled while queued");
                let cancelled = Ok(ProcessExit {
                    code: None,
                    cancelled: true,
                });
                complete(&shared, &run, &cancelled, None);
                return;
            }
            acquired
        }
        None => None,
    };

    let _ = shared.registry.update(run.id, |s| {
        s.state = SessionState::Running;
        s.start_time = Some(Utc::now());
    });
    let _ = run.sink.transmit.send_replace(2);

    if let Some(fonts_conf) = &run.write_fonts {
        let dir = &shared.options.fontconfig_directory;
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(fonts_conf_path(dir), fonts_conf).await
        }
        .await;
        if let Err(e) = written {
            warn!(error = %e, dir = %dir.display(), "failed to write fonts.conf");
        }
    }

    let sink: Arc<dyn OutputSink> = run.sink.clone();
    let result = shared
        .runner
        .run_streaming(&run.spec, sink, run.cancel.clone())
        .await;

    if result.is_ok() {
        let mut transmit = run.sink.transmit.subscribe();
        if tokio::time::timeout(wait_timeout, transmit.wait_for(|n| *n == 0))
            .await
            .is_err()
        {
            debug!("output still in transmit after wait timeout");
        }
    }

    let media_information = match (&result, run.kind) {
        (Ok(exit), SessionKind::MediaInformation) if exit.code == Some(0) && !exit.cancelled => {
            let output = run.sink.probe_output.lock().clone();
            match MediaInformation::from_json(&output) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!(error = %e, "media information could not be parsed");
                    None
                }
            }
        }
        _ => None,
    };

    complete(&shared, &run, &result, media_information);
}

/// Record the outcome, release the run and notify the callbacks. The
/// session may have left the history meanwhile; it is finalized anyway.
fn complete(
    shared: &Shared,
    run: &PreparedRun,
    result: &Result<ProcessExit, RuntimeError>,
    media_information: Option<MediaInformation>,
) {
    let _ = run.sink.transmit.send_replace(0);
    let _ = shared.registry.update(run.id, |s| {
        s.end_time = Some(Utc::now());
        match result {
            Ok(exit) => {
                s.state = SessionState::Completed;
                s.return_code = Some(return_code(*exit));
            }
            Err(e) => {
                s.state = SessionState::Failed;
                s.fail_stack_trace = Some(failure_trace(e));
            }
        }
        if media_information.is_some() {
            s.media_information = media_information;
        }
    });

    let Some(session) = shared.registry.finish(run.id) else {
        debug!("session record vanished before completion");
        return;
    };
    let code = session.return_code.map(ReturnCode::value);
    let failed = session.state == SessionState::Failed
        || session.return_code.is_some_and(ReturnCode::is_error);
    if failed {
        warn!(
            state = ?session.state,
            return_code = ?code,
            duration_ms = session.duration_ms(),
            "session finished with an error"
        );
    } else {
        info!(
            state = ?session.state,
            return_code = ?code,
            duration_ms = session.duration_ms(),
            "session finished"
        );
    }
    if let Some(callbacks) = shared.callbacks() {
        callbacks.on_session_complete(&session);
    }
}

fn return_code(exit: ProcessExit) -> ReturnCode {
    if exit.cancelled {
        return ReturnCode::CANCEL;
    }
    exit.code.map_or(ReturnCode::CANCEL, |c| ReturnCode::new(i64::from(c)))
}

fn failure_trace(error: &RuntimeError) -> String {
    let mut trace = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        trace.push_str("\ncaused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    trace
}

#[async_trait]
impl Toolkit for NativeToolkit {
    // ── Sessions ────────────────────────────────────────────────────

    fn create_session(
        &self,
        kind: SessionKind,
        arguments: Vec<String>,
        log_redirection_strategy: LogRedirectionStrategy,
    ) -> Session {
        let id = SessionId::new(self.shared.next_session_id.fetch_add(1, Ordering::SeqCst));
        let session = Session::new(id, kind, arguments, log_redirection_strategy);
        self.shared.registry.insert(session.clone());
        debug!(session_id = %id, ?kind, "session created");
        session
    }

    fn session(&self, id: SessionId) -> Result<Session, ToolkitError> {
        self.shared
            .registry
            .get(id)
            .ok_or(ToolkitError::SessionNotFound(id))
    }

    fn last_session(&self) -> Option<Session> {
        self.shared.registry.last_matching(|_| true)
    }

    fn last_completed_session(&self) -> Option<Session> {
        self.shared
            .registry
            .last_matching(|s| s.state == SessionState::Completed)
    }

    fn sessions(&self) -> Vec<Session> {
        self.shared.registry.snapshot()
    }

    fn sessions_by_kind(&self, kind: SessionKind) -> Vec<Session> {
        self.sessions().into_iter().filter(|s| s.kind == kind).collect()
    }

    fn sessions_by_state(&self, state: SessionState) -> Vec<Session> {
        self.sessions().into_iter().filter(|s| s.state == state).collect()
    }

    fn clear_sessions(&self) {
        self.shared.registry.clear();
    }

    // ── Execution ───────────────────────────────────────────────────

    async fn execute(
        &self,
        id: SessionId,
        expected: SessionKind,
        wait_timeout: Duration,
    ) -> Result<(), ToolkitError> {
        let run = self.prepare(id, expected)?;
        drive(Arc::clone(&self.shared), run, wait_timeout, None).await;
        Ok(())
    }

    fn execute_async(
        &self,
        id: SessionId,
        expected: SessionKind,
        wait_timeout: Duration,
    ) -> Result<(), ToolkitError> {
        let run = self.prepare(id, expected)?;
        let permits = Arc::clone(&self.shared.async_permits);
        let _ = tokio::spawn(drive(Arc::clone(&self.shared), run, wait_timeout, Some(permits)));
        Ok(())
    }

    fn cancel(&self, id: Option<SessionId>) {
        let tokens = match id {
            Some(id) => self.shared.registry.cancel_token(id).into_iter().collect(),
            None => self.shared.registry.cancel_tokens(),
        };
        debug!(?id, running = tokens.len(), "cancelling");
        for token in tokens {
            token.cancel();
        }
    }

    fn messages_in_transmit(&self, id: SessionId) -> usize {
        self.shared
            .registry
            .transmit(id)
            .map_or(0, |tx| *tx.borrow())
    }

    async fn wait_for_messages(&self, id: SessionId, timeout: Duration) {
        let Some(tx) = self.shared.registry.transmit(id) else {
            return;
        };
        let mut rx = tx.subscribe();
        let _ = tokio::time::timeout(timeout, rx.wait_for(|n| *n == 0)).await;
    }

    // ── Configuration ───────────────────────────────────────────────

    fn log_level(&self) -> Level {
        self.shared.config.read().log_level
    }

    fn set_log_level(&self, level: Level) {
        self.shared.config.write().log_level = level;
    }

    fn enable_redirection(&self) {
        self.shared.config.write().redirection_enabled = true;
    }

    fn disable_redirection(&self) {
        self.shared.config.write().redirection_enabled = false;
    }

    fn log_redirection_strategy(&self) -> LogRedirectionStrategy {
        self.shared.config.read().log_redirection_strategy
    }

    fn set_log_redirection_strategy(&self, strategy: LogRedirectionStrategy) {
        self.shared.config.write().log_redirection_strategy = strategy;
    }

    fn session_history_size(&self) -> usize {
        self.shared.registry.capacity()
    }

    fn set_session_history_size(&self, size: i64) -> Result<(), ToolkitError> {
        let capacity = usize::try_from(size)
            .ok()
            .filter(|n| (1..SESSION_HISTORY_HARD_LIMIT).contains(n))
            .ok_or(ToolkitError::InvalidHistorySize(size))?;
        self.shared.registry.set_capacity(capacity);
        Ok(())
    }

    fn set_fontconfig_configuration_path(&self, path: &str) {
        self.shared.config.write().fonts = FontConfig::ConfigurationPath(path.to_string());
    }

    fn set_font_directories(&self, directories: Vec<String>, name_mapping: HashMap<String, String>) {
        self.shared.config.write().fonts = FontConfig::Directories {
            directories,
            name_mapping,
        };
    }

    async fn register_new_pipe(&self) -> Option<String> {
        let dir = &self.shared.options.pipe_directory;
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(error = %e, dir = %dir.display(), "failed to create pipe directory");
            return None;
        }

        let n = self.shared.next_pipe_id.fetch_add(1, Ordering::SeqCst) + 1;
        let path = dir.join(format!("ffkit_pipe_{n}")).to_string_lossy().into_owned();
        let spec = ProcessSpec::new("mkfifo", vec![path.clone()]);
        match self.shared.runner.run_captured(&spec).await {
            Ok(out) if out.success() => {
                debug!(%path, "pipe registered");
                Some(path)
            }
            Ok(out) => {
                warn!(%path, stderr = %out.stderr.trim(), "mkfifo failed");
                None
            }
            Err(e) => {
                warn!(%path, error = %e, "mkfifo failed");
                None
            }
        }
    }

    async fn close_pipe(&self, path: &str) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(%path, error = %e, "failed to remove pipe");
        }
    }

    fn set_environment_variable(&self, name: &str, value: &str) {
        let _ = self
            .shared
            .config
            .write()
            .environment
            .insert(name.to_string(), value.to_string());
    }

    /// `SIGINT` and `SIGQUIT` start later children in their own process
    /// group. The other signals are recorded and reported only.
    fn ignore_signal(&self, signal: Signal) {
        debug!(?signal, "ignoring signal");
        let _ = self.shared.config.write().ignored_signals.insert(signal);
    }

    // ── Metadata ────────────────────────────────────────────────────

    async fn version(&self) -> String {
        self.version_info().await.version
    }

    fn is_lts_build(&self) -> bool {
        false
    }

    async fn build_date(&self) -> String {
        self.version_info().await.build_date
    }

    fn package_name(&self) -> String {
        self.shared.options.package_name.clone()
    }

    async fn external_libraries(&self) -> Vec<String> {
        self.version_info().await.external_libraries
    }

    fn arch(&self) -> String {
        std::env::consts::ARCH.to_string()
    }

    // ── Callbacks ───────────────────────────────────────────────────

    fn set_callbacks(&self, callbacks: Option<Arc<dyn ToolkitCallbacks>>) {
        *self.shared.callbacks.write() = callbacks;
    }
}

impl NativeToolkit {
    async fn version_info(&self) -> VersionInfo {
        let shared = &self.shared;
        let loaded = shared
            .version
            .get_or_try_init(|| async {
                let spec = ProcessSpec::new(&shared.options.ffmpeg_path, vec!["-version".into()]);
                let out = shared.runner.run_captured(&spec).await?;
                if !out.success() {
                    return Err(RuntimeError::Exit {
                        program: spec.program,
                        code: out.exit_code,
                    });
                }
                Ok(VersionInfo::parse(&out.stdout))
            })
            .await;
        match loaded {
            Ok(info) => info.clone(),
            Err(e) => {
                warn!(error = %e, "could not read toolkit version");
                VersionInfo::default()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
