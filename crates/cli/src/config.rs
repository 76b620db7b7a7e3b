// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Till configuration.
//!
//! Configuration lives in `<state_dir>/config.toml`. Every field has a
//! default, so a missing file (or a missing section) is valid:
//!
//! ```toml
//! [remote]
//! url = "wss://pos.example.com/sales"
//! send_timeout_ms = 10000
//!
//! [queue]
//! namespace = "till-1"
//!
//! [retry]
//! strategy = "backoff"      # or "next_trigger"
//! base_delay_ms = 1000
//! max_delay_secs = 300
//! max_attempts = 20         # omit to retry forever
//!
//! [probe]
//! interval_ms = 5000
//! timeout_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tq_sync::{EngineConfig, RetryPolicy};

use crate::error::{Error, Result};

const STATE_DIR_NAME: &str = "tillq";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "tillq.log";

/// Configuration stored in `<state_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub queue: QueueConfig,
    pub retry: RetryConfig,
    pub probe: ProbeConfig,
}

/// Sale server connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// WebSocket URL of the sale server (`ws://` or `wss://`).
    pub url: String,
    /// Bound on a single send in milliseconds (default: 10000).
    pub send_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig { url: "ws://127.0.0.1:7070".to_string(), send_timeout_ms: 10_000 }
    }
}

/// Local queue storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue file name under the state dir, without extension.
    pub namespace: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig { namespace: "sales".to_string() }
    }
}

/// Retry strategy names accepted in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyName {
    #[default]
    NextTrigger,
    Backoff,
}

/// When failed sales are retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub strategy: StrategyName,
    /// First backoff delay in milliseconds (default: 1000).
    pub base_delay_ms: u64,
    /// Backoff cap in seconds (default: 300).
    pub max_delay_secs: u64,
    /// Give up on a sale after this many failures. Absent means never.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            strategy: StrategyName::NextTrigger,
            base_delay_ms: 1_000,
            max_delay_secs: 300,
            max_attempts: None,
        }
    }
}

/// Reachability probe timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Time between checks in milliseconds (default: 5000).
    pub interval_ms: u64,
    /// Connect timeout per check in milliseconds (default: 2000).
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig { interval_ms: 5_000, timeout_ms: 2_000 }
    }
}

impl RetryConfig {
    /// The policy these settings describe.
    pub fn policy(&self) -> RetryPolicy {
        let policy = match self.strategy {
            StrategyName::NextTrigger => RetryPolicy::next_trigger(),
            StrategyName::Backoff => RetryPolicy::backoff(
                Duration::from_millis(self.base_delay_ms),
                Duration::from_secs(self.max_delay_secs),
            ),
        };
        match self.max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Loads `config.toml` from `state_dir`, or defaults if it does not exist.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let content = match fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to `state_dir`.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        fs::create_dir_all(state_dir)?;
        fs::write(state_dir.join(CONFIG_FILE_NAME), self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
    }

    /// Replaces the remote URL when an override is given.
    pub fn with_remote_url(mut self, url: Option<String>) -> Result<Self> {
        if let Some(url) = url {
            self.remote.url = url;
            self.validate()?;
        }
        Ok(self)
    }

    /// Checks values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<()> {
        let url = &self.remote.url;
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid remote URL '{}': must be ws:// or wss://",
                url
            )));
        }
        if self.remote.send_timeout_ms == 0 {
            return Err(Error::Config("send_timeout_ms must be positive".to_string()));
        }
        if self.probe.interval_ms == 0 || self.probe.timeout_ms == 0 {
            return Err(Error::Config("probe interval and timeout must be positive".to_string()));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(Error::Config("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.send_timeout_ms)
    }

    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig { send_timeout: self.send_timeout(), retry: self.retry.policy() }
    }
}

/// Picks the state directory: explicit flag, then `TILLQ_STATE_DIR`, then
/// the platform state dir, then `$XDG_STATE_HOME`/`~/.local/state`.
pub fn resolve_state_dir(flag: Option<PathBuf>, env_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag.or(env_dir) {
        return dir;
    }
    if let Some(dir) = dirs::state_dir() {
        return dir.join(STATE_DIR_NAME);
    }
    if let Some(dir) = crate::env::xdg_state_home() {
        return dir.join(STATE_DIR_NAME);
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state").join(STATE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".local/state").join(STATE_DIR_NAME))
}

/// Log file inside the state directory.
pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOG_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
