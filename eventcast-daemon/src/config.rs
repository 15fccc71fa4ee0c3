//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Path to configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Unix socket path producers publish to
    pub ingest_socket_path: String,

    /// TCP listen address for SSE subscribers
    pub http_listen_addr: String,

    /// Seconds between liveness sweeps (keepalive + prune)
    pub sweep_interval_secs: u64,

    /// Widen the ingest socket to 0666 so any local user can publish.
    /// When false the socket stays group-scoped (0660).
    pub world_writable_socket: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            ingest_socket_path: "/tmp/eventcast.sock".to_string(),
            http_listen_addr: "[::]:8080".to_string(),
            sweep_interval_secs: 30,
            world_writable_socket: true,
        }
    }
}

impl RelayConfig {
    /// Load configuration from file, or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            // Load existing config
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let mut config: RelayConfig = toml::from_str(&contents)
                .context("Failed to parse config file")?;

            config.config_path = config_path;

            // A zero interval would wedge the sweeper timer
            if config.sweep_interval_secs == 0 {
                warn!("sweep_interval_secs of 0 clamped to 1");
                config.sweep_interval_secs = 1;
            }

            Ok(config)
        } else {
            // Create default config
            let config = Self::default();
            config.save()
                .context("Failed to save default config")?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&self.config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Sweep period as a duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Get default config path
    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventcast")
            .join("config.toml")
    }
}
