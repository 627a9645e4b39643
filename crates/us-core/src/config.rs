//! Configuration management.
//!
//! Configuration is read from a TOML file. Every section has defaults so a
//! partial file (or none at all) yields a usable configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default cache name for user ID to domain mappings.
pub const DEFAULT_USER_CACHE_NAME: &str = "user_unique_id_domain_cache";

/// Default cache name for group ID to domain mappings.
pub const DEFAULT_GROUP_CACHE_NAME: &str = "group_unique_id_domain_cache";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration for the persisted domain mapping tables.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Domain resolver cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Secondary user store deployment configuration.
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache name used by the user ID domain resolver.
    #[serde(default = "default_user_cache_name")]
    pub user_cache_name: String,
    /// Cache name used by the group ID domain resolver.
    #[serde(default = "default_group_cache_name")]
    pub group_cache_name: String,
}

/// Deployment configuration for hot-deployed secondary user stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Directory scanned for per-domain user store files.
    pub userstores_dir: Option<PathBuf>,
}

fn default_database_url() -> String {
    "postgres://localhost/userstore".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_user_cache_name() -> String {
    DEFAULT_USER_CACHE_NAME.to_string()
}

fn default_group_cache_name() -> String {
    DEFAULT_GROUP_CACHE_NAME.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_cache_name: default_user_cache_name(),
            group_cache_name: default_group_cache_name(),
        }
    }
}

impl Config {
    /// Parses configuration from a TOML string.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Config` if the document is not valid TOML or does not
    /// match the configuration schema.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks cross-field constraints.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Config` when a constraint is violated.
    pub fn validate(&self) -> Result<()> {
        if self.database.min_connections > self.database.max_connections {
            return Err(Error::config(
                "database.min_connections cannot exceed database.max_connections",
            ));
        }
        if self.cache.user_cache_name.is_empty() || self.cache.group_cache_name.is_empty() {
            return Err(Error::config("cache names cannot be empty"));
        }
        if self.cache.user_cache_name == self.cache.group_cache_name {
            return Err(Error::config(
                "user and group resolver caches must use different names",
            ));
        }
        Ok(())
    }
}
