//! Runtime error types.

use std::io;

use thiserror::Error;

/// Failure while driving an executable.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The executable could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that was spawned.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the executable to exit failed.
    #[error("failed waiting for {program}: {source}")]
    Wait {
        /// Program that was waited on.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The executable exited unsuccessfully where success was required.
    #[error("{program} exited with status {code:?}")]
    Exit {
        /// Program that ran.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
    },

    /// Filesystem failure outside a child process.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Spawn failure for `program`.
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
