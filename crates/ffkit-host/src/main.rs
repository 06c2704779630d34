//! # ffkit-host
//!
//! Bridge host binary: loads settings, wires the native toolkit into the
//! bridge, and serves the method and event channels over WebSocket.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ffkit_bridge::{Bridge, LocalPlatform};
use ffkit_runtime::{NativeToolkit, NativeToolkitOptions, TokioProcessRunner};
use ffkit_server::{FfkitServer, ServerConfig};
use ffkit_settings::FfkitSettings;

/// How long open connections get to finish after ctrl-c.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// ffkit bridge host.
#[derive(Parser, Debug)]
#[command(name = "ffkit-host", about = "Media toolkit method-channel host")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (default `~/.ffkit/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Skip installing the Prometheus recorder.
    #[arg(long)]
    no_metrics: bool,
}

impl Cli {
    fn load_settings(&self) -> Result<FfkitSettings> {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(ffkit_settings::settings_path);
        let mut settings = ffkit_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        Ok(settings)
    }
}

fn build_bridge(settings: &FfkitSettings) -> Arc<Bridge> {
    let options = NativeToolkitOptions::from_settings(settings);
    let toolkit = NativeToolkit::new(options, Arc::new(TokioProcessRunner));
    Arc::new(Bridge::new(Arc::new(toolkit), &settings.bridge))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;
    ffkit_core::logging::init_subscriber(&settings.logging.level);

    let bridge = build_bridge(&settings);
    bridge.attach_engine();
    bridge.attach_platform(Arc::new(LocalPlatform));

    let mut server = FfkitServer::new(ServerConfig::from_settings(&settings.server), Arc::clone(&bridge));
    if !cli.no_metrics {
        let handle = ffkit_server::metrics::install_recorder()
            .context("Failed to install metrics recorder")?;
        server = server.with_metrics(handle);
    }

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!(
        ffmpeg = settings.toolkit.ffmpeg_path.as_str(),
        pool = settings.bridge.async_concurrency_limit,
        "ffkit host listening on ws://{addr}/ws/method"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    bridge.toolkit().cancel(None);
    server.shutdown().graceful_shutdown(Some(DRAIN_TIMEOUT)).await;
    let _ = handle.await;
    bridge.detach_platform();
    bridge.detach_engine();

    tracing::info!("Shutdown complete");
    Ok(())
}
