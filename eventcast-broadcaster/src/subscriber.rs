use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use crate::error::{BroadcastError, Result};

/// One long-lived SSE response stream registered under an endpoint
///
/// The subscriber owns the write half of the accepted connection; the read
/// half stays with the connection task, which calls [`mark_closed`] when the
/// peer goes away. A failed frame write sets the same flag, so either signal
/// makes the next prune pass drop the handle.
///
/// [`mark_closed`]: Subscriber::mark_closed
pub struct Subscriber {
    endpoint: String,
    writer: Mutex<OwnedWriteHalf>,
    closed: AtomicBool,
}

impl Subscriber {
    pub fn new(endpoint: impl Into<String>, writer: OwnedWriteHalf) -> Self {
        Self {
            endpoint: endpoint.into(),
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
        }
    }

    /// Endpoint this stream subscribed to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Point-in-time liveness check
    pub fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Flag the connection dead; the next prune pass removes it
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Write one encoded frame to the stream
    ///
    /// A write failure flags the subscriber dead and is reported to the
    /// caller, which is expected to log and carry on with the fan-out.
    pub async fn send(&self, frame: &[u8]) -> Result<()> {
        if !self.is_alive() {
            return Err(BroadcastError::SubscriberClosed);
        }

        let mut writer = self.writer.lock().await;
        match writer.write_all(frame).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_closed();
                Err(BroadcastError::Io(e))
            }
        }
    }
}
