//! Scripted [`ProcessRunner`] for tests.
//!
//! Replays canned output instead of spawning executables, and records every
//! [`ProcessSpec`] it was asked to run.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::errors::RuntimeError;
use crate::process::{CapturedOutput, OutputSink, OutputStream, ProcessExit, ProcessRunner, ProcessSpec};

/// How a scripted run ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Exit with this code.
    Exit(i32),
    /// Keep both streams open until cancelled, then die by signal.
    UntilCancelled,
    /// Fail to spawn with this message.
    SpawnError(String),
}

/// Canned output for one streamed run.
#[derive(Clone, Debug)]
pub struct Script {
    /// Lines written to stdout.
    pub stdout: Vec<String>,
    /// Lines written to stderr.
    pub stderr: Vec<String>,
    /// Pause after the output, before the outcome.
    pub delay: Option<Duration>,
    /// Ending.
    pub outcome: ScriptOutcome,
}

impl Script {
    /// Run that exits with `code`.
    pub fn exit(code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            delay: None,
            outcome: ScriptOutcome::Exit(code),
        }
    }

    /// Run that only ends when cancelled.
    pub fn until_cancelled() -> Self {
        Self {
            outcome: ScriptOutcome::UntilCancelled,
            ..Self::exit(0)
        }
    }

    /// Run that cannot be spawned.
    pub fn spawn_error(message: &str) -> Self {
        Self {
            outcome: ScriptOutcome::SpawnError(message.to_string()),
            ..Self::exit(0)
        }
    }

    /// Add stdout lines.
    #[must_use]
    pub fn with_stdout(mut self, lines: &[&str]) -> Self {
        self.stdout.extend(lines.iter().map(|l| (*l).to_string()));
        self
    }

    /// Add stderr lines.
    #[must_use]
    pub fn with_stderr(mut self, lines: &[&str]) -> Self {
        self.stderr.extend(lines.iter().map(|l| (*l).to_string()));
        self
    }

    /// Pause before exiting. Cancellation cuts the pause short.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// [`ProcessRunner`] that replays queued scripts.
///
/// An empty queue behaves like a silent process exiting with 0.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    runs: Mutex<VecDeque<Script>>,
    captured: Mutex<VecDeque<CapturedOutput>>,
    invocations: Mutex<Vec<ProcessSpec>>,
}

impl ScriptedRunner {
    /// Empty runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a script for the next streamed run.
    pub fn push_run(&self, script: Script) {
        self.runs.lock().push_back(script);
    }

    /// Queue output for the next captured run.
    pub fn push_captured(&self, output: CapturedOutput) {
        self.captured.lock().push_back(output);
    }

    /// Every spec run so far, streamed or captured, in order.
    pub fn invocations(&self) -> Vec<ProcessSpec> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run_streaming(
        &self,
        spec: &ProcessSpec,
        sink: Arc<dyn OutputSink>,
        cancel: CancellationToken,
    ) -> Result<ProcessExit, RuntimeError> {
        self.invocations.lock().push(spec.clone());
        let script = self.runs.lock().pop_front().unwrap_or_else(|| Script::exit(0));

        if let ScriptOutcome::SpawnError(message) = &script.outcome {
            return Err(RuntimeError::spawn(
                &spec.program,
                io::Error::new(io::ErrorKind::NotFound, message.clone()),
            ));
        }

        for line in &script.stdout {
            sink.line(OutputStream::Stdout, line);
        }
        for line in &script.stderr {
            sink.line(OutputStream::Stderr, line);
        }

        let mut cancelled = false;
        if let Some(delay) = script.delay {
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => cancelled = true,
            }
        }
        let code = match script.outcome {
            ScriptOutcome::Exit(code) if !cancelled => Some(code),
            ScriptOutcome::UntilCancelled if !cancelled => {
                cancel.cancelled().await;
                cancelled = true;
                None
            }
            _ => None,
        };

        sink.closed(OutputStream::Stdout);
        sink.closed(OutputStream::Stderr);
        Ok(ProcessExit { code, cancelled })
    }

    async fn run_captured(&self, spec: &ProcessSpec) -> Result<CapturedOutput, RuntimeError> {
        self.invocations.lock().push(spec.clone());
        Ok(self.captured.lock().pop_front().unwrap_or_else(|| CapturedOutput {
            exit_code: Some(0),
            ..CapturedOutput::default()
        }))
    }
}
