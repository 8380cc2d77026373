//! Configuration management for flatrest.
//!
//! Configuration is resolved from multiple sources, later ones winning:
//! 1. Built-in defaults
//! 2. Config file: `flatrest.json` in the working directory, or an explicit path
//! 3. Environment overrides: `FLATREST_*` variables
//! 4. Command-line flags (applied by the binary)

use crate::error::ConfigError;
use flatrest_storage::json::DEFAULT_STORE_PATH;
use flatrest_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "flatrest.json";

/// Default listen address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8001";

/// Environment variable overriding the store path.
pub const ENV_STORE: &str = "FLATREST_STORE";
/// Environment variable overriding the listen address.
pub const ENV_ADDRESS: &str = "FLATREST_ADDRESS";
/// Environment variable overriding the route prefix.
pub const ENV_PREFIX: &str = "FLATREST_PREFIX";
/// Environment variable overriding the log level.
pub const ENV_LOG: &str = "FLATREST_LOG";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON document holding every collection. Relative paths are resolved
    /// against the working directory.
    pub store_path: PathBuf,

    /// Address the HTTP server binds to.
    pub address: SocketAddr,

    /// Prefix the entity routes are mounted under, e.g. `/api`.
    pub api_prefix: String,

    /// Write the store as indented JSON.
    pub pretty: bool,

    /// Log level.
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            address: SocketAddr::from(([127, 0, 0, 1], 8001)),
            api_prefix: String::new(),
            pretty: false,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a config file and the process environment.
    ///
    /// If `explicit` is given that file must exist; otherwise
    /// `flatrest.json` in `dir` is used when present.
    /// Returns the config and the files it was read from.
    pub async fn load(
        dir: &Path,
        explicit: Option<&Path>,
    ) -> Result<(Self, Vec<PathBuf>), ConfigError> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        match explicit {
            Some(path) => {
                config = Self::load_file(path).await?;
                sources.push(path.to_path_buf());
            }
            None => {
                let path = dir.join(CONFIG_FILE_NAME);
                if path.exists() {
                    config = Self::load_file(&path).await?;
                    sources.push(path);
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok())?;

        Ok((config, sources))
    }

    /// Load configuration from a specific file.
    pub async fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse configuration text.
    pub fn parse(content: &str, source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::InvalidJson {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `FLATREST_*` overrides looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(store) = lookup(ENV_STORE) {
            self.store_path = PathBuf::from(store);
        }

        if let Some(address) = lookup(ENV_ADDRESS) {
            self.address = address.parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_ADDRESS.to_string(),
                message: format!("{}", e),
            })?;
        }

        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.api_prefix = prefix;
        }

        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = LogLevel::parse(&level).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_LOG.to_string(),
                message: format!("unknown log level '{}'", level),
            })?;
        }

        Ok(())
    }

    /// The store path, resolved against `cwd` when relative.
    pub fn resolve_store_path(&self, cwd: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            cwd.join(&self.store_path)
        }
    }

    /// The route prefix with a leading slash and no trailing slash, or an
    /// empty string for the root.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}
