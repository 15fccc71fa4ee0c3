//! Command-line publisher for the eventcast relay
//!
//! Serializes one command and writes it to the daemon's ingest socket.
//! Useful for scripts and for smoke-testing a running relay:
//!
//! ```text
//! eventcast-publish /event --event subscriber --data lrrbot --id 12345
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

use eventcast_protocol::Command;

/// Publish one event to a running eventcast daemon
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Endpoint path to publish to, e.g. /event
    endpoint: String,

    /// SSE event name
    #[arg(long)]
    event: Option<String>,

    /// Payload; embedded newlines become multiple data lines
    #[arg(long)]
    data: Option<String>,

    /// SSE record id
    #[arg(long)]
    id: Option<String>,

    /// Ingest socket path
    #[arg(long, default_value = "/tmp/eventcast.sock")]
    socket: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let command = Command {
        endpoint: args.endpoint,
        event: args.event,
        data: args.data,
        id: args.id,
    };
    let line = command.to_json_line().context("Failed to encode command")?;

    let mut stream = UnixStream::connect(&args.socket)
        .await
        .with_context(|| format!("Failed to connect to ingest socket {}", args.socket))?;

    // One-way protocol: write the line and hang up, nothing comes back
    stream
        .write_all(line.as_bytes())
        .await
        .context("Failed to write command")?;
    stream.shutdown().await?;

    Ok(())
}
