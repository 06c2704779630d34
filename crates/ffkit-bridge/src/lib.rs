//! # ffkit-bridge
//!
//! Method-channel adapter between a UI layer and the media toolkit.
//!
//! - **Requests**: [`Invocation`]s are decoded into typed [`Request`]s before
//!   any handler runs; unknown methods resolve not-implemented
//! - **Dispatch**: non-blocking requests run inline, blocking ones on the
//!   bounded [`ExecutionPool`]
//! - **Results**: every call owns one [`ResultSink`] and resolves exactly once
//! - **Events**: [`EventBroadcaster`] turns toolkit callbacks into envelopes
//!   for the single event subscriber
//! - **Lifecycle**: [`Bridge`] registers and tears down the toolkit callbacks
//!   as the engine and platform attach and detach

#![deny(unsafe_code)]

pub mod context;
pub mod dispatcher;
pub mod events;
mod handlers;
pub mod lifecycle;
pub mod marshal;
pub mod platform;
pub mod pool;
pub mod request;
pub mod sink;

pub use context::BridgeContext;
pub use events::{EventBroadcaster, SubscriptionHandle};
pub use lifecycle::Bridge;
pub use platform::{DocumentRequest, LocalPlatform, Platform, PlatformError, SelectOutcome};
pub use pool::ExecutionPool;
pub use request::{Invocation, Rejection, Request};
pub use sink::{Resolution, ResultReceiver, ResultSink};
