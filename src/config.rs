//! Daemon configuration from an optional JSON file. Every field has a default.
//!
//! ```json
//! {
//!   "scan_interval_secs": 5,
//!   "ignored_games": ["Wallpaper Engine"],
//!   "api_version": 10,
//!   "catalog_ttl_hours": 24,
//!   "socket_timeout_ms": 2000,
//!   "clear_on_disconnect": true
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::catalog::fetch::DEFAULT_API_VERSION;

/// Errors from loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between scans. Values below 1 are raised to 1.
    pub scan_interval_secs: u64,
    /// Folder names ignored in addition to the built-in list.
    pub ignored_games: Vec<String>,
    /// API version of the catalog endpoint.
    pub api_version: u32,
    pub catalog_ttl_hours: u64,
    /// Bound on each IPC socket operation.
    pub socket_timeout_ms: u64,
    /// Send an empty activity before closing when the game exits.
    pub clear_on_disconnect: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_interval_secs: 5,
            ignored_games: Vec::new(),
            api_version: DEFAULT_API_VERSION,
            catalog_ttl_hours: 24,
            socket_timeout_ms: 2000,
            clear_on_disconnect: true,
        }
    }
}

impl Config {
    /// `~/.config/steam-presenced/config.json`, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("steam-presenced").join("config.json"))
    }

    /// Load from `path`. A missing file yields the defaults; an unreadable
    /// or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_hours.saturating_mul(3600))
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms.max(1))
    }
}
