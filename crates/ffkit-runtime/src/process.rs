//! Child-process execution.
//!
//! [`ProcessRunner`] is the seam between the toolkit and the operating
//! system: [`TokioProcessRunner`] spawns real executables, the scripted
//! runner in [`crate::testing`] replays canned output.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::RuntimeError;

/// What to run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Executable path or name.
    pub program: String,
    /// Arguments, without the program.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub env: HashMap<String, String>,
    /// Start the child in a new process group (unix).
    pub own_process_group: bool,
}

impl ProcessSpec {
    /// Spec with no extra environment.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: HashMap::new(),
            own_process_group: false,
        }
    }
}

/// Which output stream a line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Receiver of a running process's output.
pub trait OutputSink: Send + Sync {
    /// One line, without its terminator.
    fn line(&self, stream: OutputStream, line: &str);

    /// The stream reached end of file.
    fn closed(&self, stream: OutputStream);
}

/// How a streamed process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Whether the run was cancelled.
    pub cancelled: bool,
}

/// Output of a process run to completion with captured streams.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CapturedOutput {
    /// Exit code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Subprocess execution.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a process, delivering output line by line as it arrives.
    ///
    /// Both streams are fully drained before this returns. Cancelling the
    /// token kills the process.
    async fn run_streaming(
        &self,
        spec: &ProcessSpec,
        sink: Arc<dyn OutputSink>,
        cancel: CancellationToken,
    ) -> Result<ProcessExit, RuntimeError>;

    /// Run a short-lived process and capture its output.
    async fn run_captured(&self, spec: &ProcessSpec) -> Result<CapturedOutput, RuntimeError>;
}

/// Real subprocess execution backed by `tokio::process::Command`.
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn command(spec: &ProcessSpec) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&spec.program);
        let _ = cmd
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        if spec.own_process_group {
            let _ = cmd.process_group(0);
        }
        cmd
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run_streaming(
        &self,
        spec: &ProcessSpec,
        sink: Arc<dyn OutputSink>,
        cancel: CancellationToken,
    ) -> Result<ProcessExit, RuntimeError> {
        debug!(program = %spec.program, args = ?spec.args, "spawning process");

        let mut child = Self::command(spec)
            .spawn()
            .map_err(|e| RuntimeError::spawn(&spec.program, e))?;

        let readers = [
            spawn_reader(child.stdout.take(), OutputStream::Stdout, Arc::clone(&sink)),
            spawn_reader(child.stderr.take(), OutputStream::Stderr, Arc::clone(&sink)),
        ];

        let wait_error = |source| RuntimeError::Wait {
            program: spec.program.clone(),
            source,
        };

        let (status, cancelled) = tokio::select! {
            status = child.wait() => (status.map_err(wait_error)?, false),
            () = cancel.cancelled() => {
                debug!(program = %spec.program, "process cancelled");
                let _ = child.start_kill();
                (child.wait().await.map_err(wait_error)?, true)
            }
        };

        for reader in readers {
            let _ = reader.await;
        }

        debug!(program = %spec.program, code = ?status.code(), cancelled, "process exited");
        Ok(ProcessExit {
            code: status.code(),
            cancelled,
        })
    }

    async fn run_captured(&self, spec: &ProcessSpec) -> Result<CapturedOutput, RuntimeError> {
        let output = Self::command(spec)
            .output()
            .await
            .map_err(|e| RuntimeError::spawn(&spec.program, e))?;
        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

fn spawn_reader<R>(
    stream: Option<R>,
    kind: OutputStream,
    sink: Arc<dyn OutputSink>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Some(stream) = stream {
            let mut reader = BufReader::new(stream);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        sink.line(kind, line.trim_end_matches(['\n', '\r']));
                    }
                }
            }
        }
        sink.closed(kind);
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
