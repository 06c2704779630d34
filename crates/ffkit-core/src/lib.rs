//! # ffkit-core
//!
//! Shared vocabulary for the ffkit method-channel bridge.
//!
//! - **Session ids**: [`SessionId`] newtype over the toolkit's integer ids
//! - **Sessions**: [`Session`] snapshots with kind, state, timestamps, logs, statistics
//! - **Logs**: [`Log`] entries, numeric [`Level`]s, [`LogRedirectionStrategy`]
//! - **Statistics**: per-frame encoding [`Statistics`] samples
//! - **Media information**: [`MediaInformation`] parsed from ffprobe JSON output
//! - **Toolkit seam**: the [`Toolkit`] trait the bridge drives, and the
//!   [`ToolkitCallbacks`] capability the toolkit pushes events into
//! - **Errors**: [`ToolkitError`] and the wire-level [`MethodError`] codes

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod ids;
pub mod log;
pub mod logging;
pub mod media;
pub mod session;
pub mod signal;
pub mod statistics;
pub mod toolkit;

pub use errors::rpc::{ErrorCode, MethodError};
pub use errors::ToolkitError;
pub use ids::SessionId;
pub use log::{Level, Log, LogRedirectionStrategy};
pub use media::{Chapter, MediaInformation, StreamInformation};
pub use session::{ReturnCode, Session, SessionKind, SessionState};
pub use signal::Signal;
pub use statistics::Statistics;
pub use toolkit::{Toolkit, ToolkitCallbacks};
