//! # ffkit-runtime
//!
//! Toolkit backend that runs the `ffmpeg` and `ffprobe` executables.
//!
//! - **Processes**: [`ProcessRunner`] seam with the tokio-backed [`TokioProcessRunner`]
//! - **Parsing**: stderr log lines and `-progress` statistics blocks
//! - **History**: bounded [`SessionRegistry`] with per-run cancel and transmit handles
//! - **Toolkit**: [`NativeToolkit`], the [`ffkit_core::Toolkit`] implementation

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod metadata;
pub mod parse;
pub mod process;
pub mod registry;
pub mod testing;
pub mod toolkit;

pub use config::{FontConfig, ToolkitConfig};
pub use errors::RuntimeError;
pub use metadata::VersionInfo;
pub use process::{
    CapturedOutput, OutputSink, OutputStream, ProcessExit, ProcessRunner, ProcessSpec,
    TokioProcessRunner,
};
pub use registry::SessionRegistry;
pub use toolkit::{NativeToolkit, NativeToolkitOptions};
