//! Shared wire types for the eventcast relay
//!
//! Producers publish newline-delimited JSON commands over the ingest socket;
//! subscribers receive Server-Sent-Events frames over HTTP. This crate holds
//! the command schema and the SSE frame encoder shared by both sides.
//!
//! # Wire Formats
//!
//! - Ingest: one JSON object per line, `{"endpoint": "/event", "event"?,
//!   "data"?, "id"?}`
//! - Delivery: one SSE record per command, terminated by a blank line

pub mod command;
pub mod frame;

// Re-exports
pub use command::Command;
pub use frame::{encode, KEEPALIVE_FRAME};
