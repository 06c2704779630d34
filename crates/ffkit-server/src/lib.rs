//! # ffkit-server
//!
//! Axum HTTP + `WebSocket` host for the ffkit bridge.
//!
//! - `GET /ws/method`: JSON call/reply frames routed through the bridge
//! - `GET /ws/events`: toolkit event envelopes for the single subscriber
//! - `GET /health` and `GET /metrics` (Prometheus)
//! - Graceful shutdown via `CancellationToken` and a connection task tracker

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::FfkitServer;
pub use shutdown::ShutdownCoordinator;
