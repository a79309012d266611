//! Configuration loading and validation

use anyhow::Result;
use netscope_session::DriverConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Path to the device inventory file
    #[serde(default = "default_inventory_path")]
    pub path: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: default_inventory_path(),
        }
    }
}

fn default_inventory_path() -> String {
    "./inventory.toml".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Blocking device calls allowed in flight at once
    #[serde(default = "default_max_blocking")]
    pub max_blocking: usize,
    /// Deadline for a single blocking device call
    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,
    /// Disconnect sessions unused for this long (0 to disable)
    #[serde(default)]
    pub idle_timeout_secs: u64,
    /// How often to look for idle sessions
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_blocking: default_max_blocking(),
            op_timeout_secs: default_op_timeout(),
            idle_timeout_secs: 0,
            reap_interval_secs: default_reap_interval(),
        }
    }
}

impl SessionsConfig {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs.max(1))
    }
}

fn default_max_blocking() -> usize {
    16
}

fn default_op_timeout() -> u64 {
    60
}

fn default_reap_interval() -> u64 {
    30
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
