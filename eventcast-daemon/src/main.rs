//! Eventcast Daemon - Local Event-Broadcast Relay
//!
//! Runs as a background service, accepting publish commands over a Unix
//! socket and fanning each one out as a Server-Sent-Events frame to every
//! HTTP subscriber registered under the same endpoint path.
//! Producer socket write → broadcast dispatch → subscriber streams.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use eventcast_broadcaster::Broadcaster;
use eventcast_daemon::config::RelayConfig;
use eventcast_daemon::http::SubscribeListener;
use eventcast_daemon::ingest::IngestListener;
use eventcast_daemon::socket_utils;

/// Local event-broadcast relay: Unix socket in, Server-Sent Events out
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Override the ingest socket path
    #[arg(long)]
    socket: Option<String>,

    /// Override the HTTP listen address
    #[arg(long)]
    listen: Option<String>,

    /// Override the sweep interval in seconds
    #[arg(long)]
    sweep_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    info!("Starting Eventcast Daemon v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = RelayConfig::load()
        .context("Failed to load configuration")?;

    info!("Configuration loaded from {}", config.config_path.display());

    if let Some(socket) = args.socket {
        config.ingest_socket_path = socket;
    }
    if let Some(listen) = args.listen {
        config.http_listen_addr = listen;
    }
    if let Some(sweep_interval) = args.sweep_interval {
        config.sweep_interval_secs = sweep_interval.max(1);
    }

    let broadcaster = Arc::new(Broadcaster::new());

    // Both binds are fatal: the relay is useless with either side missing
    let ingest = IngestListener::bind(
        &config.ingest_socket_path,
        Arc::clone(&broadcaster),
        config.world_writable_socket,
    )
    .context("Failed to start ingest listener")?;

    let subscribe = SubscribeListener::bind(&config.http_listen_addr, Arc::clone(&broadcaster))
        .await
        .context("Failed to start subscription listener")?;

    let sweeper = broadcaster.spawn_sweeper(config.sweep_interval());
    info!(
        "Liveness sweeper running every {}s",
        config.sweep_interval_secs
    );

    info!("🚀 Eventcast relay ready");

    tokio::select! {
        result = ingest.run() => {
            if let Err(e) = result {
                error!("Ingest listener error: {}", e);
            }
        }
        result = subscribe.run() => {
            if let Err(e) = result {
                error!("Subscription listener error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Received shutdown signal");
        }
    }

    // Cleanup
    sweeper.abort();
    socket_utils::remove_stale_socket(std::path::Path::new(&config.ingest_socket_path));
    info!("Eventcast daemon stopped");

    Ok(())
}
