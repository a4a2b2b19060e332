//! Configuration for hosts embedding the preloader.
//!
//! Configuration is stored in TOML format. It only covers where the cache
//! lives and how HTTP requests identify themselves; the pipeline tunables
//! ([`BATCH_SIZE`](crate::BATCH_SIZE), [`PRELOAD_TIMEOUT`](crate::PRELOAD_TIMEOUT))
//! are fixed constants.
//!
//! ## File Location
//!
//! - Linux: `~/.config/imgstash/config.toml`
//! - macOS: `~/Library/Application Support/dev.imgstash.imgstash/config.toml`
//! - Windows: `%APPDATA%\imgstash\imgstash\config\config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [store]
//! enabled = true
//! root = "/home/user/.local/share/imgstash"
//!
//! [http]
//! user_agent = "imgstash/0.1.0"
//! request_timeout_secs = 30
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Persistent store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Where and whether images are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// When `false` the preloader runs memory-only and nothing is written.
    pub enabled: bool,
    /// Directory that holds the `imgstash/` store.
    pub root: PathBuf,
}

/// HTTP client identity and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: directories::ProjectDirs::from("dev", "imgstash", "imgstash").map_or_else(
                || {
                    directories::BaseDirs::new().map_or_else(
                        || PathBuf::from(".imgstash"),
                        |base| base.home_dir().join(".imgstash"),
                    )
                },
                |dirs| dirs.data_dir().to_path_buf(),
            ),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("imgstash/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from the platform config directory.
    ///
    /// Falls back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to the platform config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content).map_err(|e| Error::Config(format!("Failed to write config: {e}")))
    }

    fn config_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("dev", "imgstash", "imgstash")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
