use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use eventcast_protocol::{frame, Command};

use crate::registry::Registry;
use crate::subscriber::Subscriber;

/// Fan-out hub for the relay
///
/// Owns the subscriber registry and turns each decoded command into one
/// encoded SSE frame written to every live subscriber of its endpoint.
pub struct Broadcaster {
    registry: Registry,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Register a new subscriber stream under `endpoint`
    ///
    /// Returns the handle so the connection task can flag it closed when the
    /// peer disconnects.
    pub async fn subscribe(
        &self,
        endpoint: impl Into<String>,
        writer: OwnedWriteHalf,
    ) -> Arc<Subscriber> {
        let subscriber = Arc::new(Subscriber::new(endpoint, writer));
        self.registry.register(Arc::clone(&subscriber)).await;
        tracing::info!("Subscriber added for {}", subscriber.endpoint());
        subscriber
    }

    /// Deliver one command to every live subscriber of its endpoint
    ///
    /// The target list is pruned first, the frame encoded once, and each
    /// write isolated: one dead peer never stops delivery to the rest. An
    /// endpoint with no subscribers is a silent no-op.
    pub async fn dispatch(&self, command: &Command) {
        self.registry.prune(&command.endpoint).await;

        let subscribers = self.registry.snapshot(&command.endpoint).await;
        if subscribers.is_empty() {
            tracing::debug!("No subscribers for {}, dropping command", command.endpoint);
            return;
        }

        let frame = frame::encode(command);
        for subscriber in &subscribers {
            if let Err(e) = subscriber.send(&frame).await {
                tracing::warn!(
                    "Failed to send to subscriber on {}: {}",
                    command.endpoint,
                    e
                );
            }
        }
        tracing::debug!(
            "Dispatched {} byte frame to {} subscriber(s) on {}",
            frame.len(),
            subscribers.len(),
            command.endpoint
        );
    }

    /// One sweeper tick: prune everywhere, then keep idle connections warm
    ///
    /// The keepalive comment frame defeats idle-connection reaping by
    /// intermediary proxies; SSE streams are otherwise silent between events.
    pub async fn sweep(&self) {
        self.registry.prune_all().await;

        for subscriber in self.registry.snapshot_all().await {
            if let Err(e) = subscriber.send(frame::KEEPALIVE_FRAME).await {
                tracing::debug!(
                    "Keepalive failed for subscriber on {}: {}",
                    subscriber.endpoint(),
                    e
                );
            }
        }
    }

    /// Spawn the periodic liveness sweeper
    ///
    /// Runs until the returned handle is aborted. The first sweep fires one
    /// full period after start.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let broadcaster = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                broadcaster.sweep().await;
            }
        })
    }

    /// Current subscriber count across all endpoints
    pub async fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count().await
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
