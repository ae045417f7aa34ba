//! Configuration management for the sync client.
//!
//! Loads configuration from an optional TOML file; every field has a default.

use crate::sync::signature::{DEFAULT_BLOCK_SIZE, DEFAULT_CRYPTO_HASH_SIZE};
use crate::sync::BlockOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Upper bound on waiting for the remote's answer, in seconds
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout, in seconds
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Signature block size in bytes (default: 16KB)
    pub block_size: u32,

    /// Strong hash bytes kept per block (1-16)
    pub crypto_hash_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            crypto_hash_size: DEFAULT_CRYPTO_HASH_SIZE,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SyncConfig {
    pub fn block_options(&self) -> BlockOptions {
        BlockOptions {
            block_size: self.block_size,
            crypto_hash_size: self.crypto_hash_size,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.remote.timeout(), Duration::from_secs(300));
        assert_eq!(config.sync.block_options(), BlockOptions::default());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("deltasync.toml");
        std::fs::write(
            &path,
            "[remote]\ntimeout_secs = 5\n\n[sync]\nblock_size = 4096\n",
        )?;

        let config = Config::from_file(&path)?;

        assert_eq!(config.remote.timeout_secs, 5);
        assert_eq!(config.remote.connect_timeout_secs, 30);
        assert_eq!(config.sync.block_size, 4096);
        assert_eq!(config.sync.crypto_hash_size, DEFAULT_CRYPTO_HASH_SIZE);
        assert_eq!(config.log.level, "info");
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[remote]\ntimeout_secs = \"soon\"\n").unwrap();

        assert!(Config::from_file(&path).is_err());
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
