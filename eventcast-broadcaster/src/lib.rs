//! Fan-out core for the eventcast relay
//!
//! This crate owns the subscriber registry and delivers encoded SSE frames to
//! every live subscriber of an endpoint. It manages multiple concurrent
//! long-lived subscriber streams, per-endpoint pruning of dead connections,
//! and the periodic keepalive sweep.
//!
//! # Features
//!
//! - Endpoint-keyed subscriber registry, registration order preserved
//! - Prune-before-broadcast delivery, one encode per command
//! - Per-subscriber write isolation (one dead peer never blocks the rest)
//! - Periodic liveness sweeper with `: keepalive` comment frames
//!
//! # Example Usage
//!
//! ```no_run
//! use eventcast_broadcaster::Broadcaster;
//! use eventcast_protocol::Command;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(writer: tokio::net::tcp::OwnedWriteHalf) {
//! let broadcaster = Arc::new(Broadcaster::new());
//!
//! // Register a subscriber stream under an endpoint
//! let subscriber = broadcaster.subscribe("/event", writer).await;
//!
//! // Deliver a command to every live subscriber of its endpoint
//! let command = Command {
//!     endpoint: "/event".to_string(),
//!     event: Some("subscriber".to_string()),
//!     data: Some("lrrbot".to_string()),
//!     id: None,
//! };
//! broadcaster.dispatch(&command).await;
//!
//! // Keep idle connections alive
//! let sweeper = broadcaster.spawn_sweeper(Duration::from_secs(30));
//! # drop(sweeper);
//! # drop(subscriber);
//! # }
//! ```

pub mod broadcaster;
pub mod error;
pub mod registry;
pub mod subscriber;

// Re-exports
pub use broadcaster::Broadcaster;
pub use error::{BroadcastError, Result};
pub use registry::Registry;
pub use subscriber::Subscriber;
