//! WebSocket channels.
//!
//! - `method`: request/reply frames routed through the bridge
//! - `events`: one-way envelope stream for the single subscriber
//! - `frames`: wire shapes of the method channel

pub mod events;
pub mod frames;
pub mod method;
