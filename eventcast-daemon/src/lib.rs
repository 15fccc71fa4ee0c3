//! Eventcast daemon library
//!
//! This module re-exports the daemon's modules for integration testing.

pub mod config;
pub mod http;
pub mod ingest;
pub mod socket_utils;
