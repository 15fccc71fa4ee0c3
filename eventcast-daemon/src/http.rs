//! HTTP subscription listener
//!
//! Every request, whatever its method, is treated as a subscribe request for
//! the endpoint equal to the request path. The response head goes out
//! immediately and the connection is held open as an unbounded SSE stream;
//! the relay never closes it, the peer does.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use eventcast_broadcaster::Broadcaster;

const RESPONSE_HEAD: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream; charset=utf-8\r\n\r\n";

/// Accepts HTTP connections and registers each as an SSE subscriber
pub struct SubscribeListener {
    listener: TcpListener,
    broadcaster: Arc<Broadcaster>,
}

impl SubscribeListener {
    /// Bind the subscription port; fatal on failure
    pub async fn bind(addr: &str, broadcaster: Arc<Broadcaster>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind subscription listener on {}", addr))?;

        info!("Subscription listener on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            broadcaster,
        })
    }

    /// Actual bound address, useful when the port was 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept subscriber connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .context("Failed to accept subscriber connection")?;

            debug!("Subscriber connection from {}", addr);
            let broadcaster = Arc::clone(&self.broadcaster);
            tokio::spawn(async move {
                if let Err(e) = handle_subscriber(stream, broadcaster).await {
                    debug!("Subscriber connection ended: {}", e);
                }
            });
        }
    }
}

/// Upgrade one HTTP request to an SSE stream and watch it for close
async fn handle_subscriber(stream: TcpStream, broadcaster: Arc<Broadcaster>) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let endpoint = match parse_request_path(&request_line) {
        Some(path) => path,
        None => {
            warn!("Dropping connection with unparseable request line");
            return Ok(());
        }
    };

    // Drain headers; a subscribe request carries nothing we need
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    write_half.write_all(RESPONSE_HEAD).await?;

    let subscriber = broadcaster.subscribe(endpoint.clone(), write_half).await;

    // The peer sends nothing more on a healthy stream, so the next read
    // resolving is the close signal.
    let mut drain = [0u8; 512];
    loop {
        match reader.read(&mut drain).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }

    subscriber.mark_closed();
    debug!("Subscriber for {} disconnected", endpoint);
    Ok(())
}

/// Extract the path from an HTTP request line, e.g. `GET /event HTTP/1.1`
///
/// The path is the endpoint key, matched verbatim; the method is ignored.
fn parse_request_path(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    let _method = parts.next()?;
    let path = parts.next()?;
    if !path.starts_with('/') {
        return None;
    }
    Some(path.to_string())
}
