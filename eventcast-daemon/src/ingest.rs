//! Unix socket ingest listener for publish commands

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use eventcast_broadcaster::Broadcaster;
use eventcast_protocol::Command;

use crate::socket_utils;

/// Accepts producer connections and feeds decoded commands to the broadcaster
pub struct IngestListener {
    listener: UnixListener,
    broadcaster: Arc<Broadcaster>,
}

impl IngestListener {
    /// Bind the ingest socket, replacing any stale socket file
    ///
    /// A bind failure here is fatal: the relay cannot serve its purpose
    /// without its ingest side.
    pub fn bind(
        socket_path: &str,
        broadcaster: Arc<Broadcaster>,
        world_writable: bool,
    ) -> Result<Self> {
        socket_utils::remove_stale_socket(Path::new(socket_path));

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind ingest socket {}", socket_path))?;

        socket_utils::set_socket_permissions(Path::new(socket_path), world_writable)?;

        info!("Ingest listener on {}", socket_path);

        Ok(Self {
            listener,
            broadcaster,
        })
    }

    /// Accept producer connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, _) = self
                .listener
                .accept()
                .await
                .context("Failed to accept producer connection")?;

            debug!("Producer connected");
            let broadcaster = Arc::clone(&self.broadcaster);
            tokio::spawn(async move {
                handle_producer(stream, broadcaster).await;
            });
        }
    }
}

/// Read newline-delimited JSON commands until the producer disconnects
///
/// Commands from one connection dispatch in the order their lines complete.
/// A malformed line (invalid JSON, missing endpoint, bad UTF-8) is logged
/// and skipped; it never tears down the connection or the process. A
/// trailing line without its newline is discarded at EOF.
async fn handle_producer(stream: UnixStream, broadcaster: Arc<Broadcaster>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() != Some(&b'\n') {
                    debug!("Discarding {} byte partial line at producer EOF", buf.len());
                    break;
                }

                let line = String::from_utf8_lossy(&buf);
                match Command::from_json_line(line.trim_end()) {
                    Ok(command) => broadcaster.dispatch(&command).await,
                    Err(e) => warn!("Ignoring malformed publish line: {}", e),
                }
            }
            Err(e) => {
                warn!("Producer read error: {}", e);
                break;
            }
        }
    }

    debug!("Producer disconnected");
}
