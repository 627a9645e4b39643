//! Connection pool for the domain mapping tables.
//!
//! The resolver performs no timeouts of its own, so every connection is
//! opened with a server-side `statement_timeout`.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;
use us_core::config::DatabaseConfig;
use us_storage::StorageError;

/// `application_name` reported to the server.
pub const APPLICATION_NAME: &str = "userstore-domain-resolver";

/// Pool settings for the mapping database.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connection URL.
    pub url: String,
    /// Upper bound of open connections.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
    /// Server-side limit for a single statement.
    pub statement_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            acquire_timeout: timeout,
            statement_timeout: timeout,
        }
    }
}

impl PoolConfig {
    /// Creates settings for `url` with default bounds.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the connection upper bound.
    #[must_use]
    pub const fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the statement timeout.
    #[must_use]
    pub const fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    fn connect_options(&self) -> Result<PgConnectOptions, StorageError> {
        let options = PgConnectOptions::from_str(&self.url)
            .map_err(|e| StorageError::Connection(format!("invalid database url: {e}")))?;
        Ok(options
            .application_name(APPLICATION_NAME)
            .options([("statement_timeout", self.statement_timeout.as_millis())]))
    }
}

/// Opens a pool to the mapping database.
///
/// ## Errors
///
/// Returns `StorageError::Connection` if the URL is malformed or the server
/// is unreachable.
pub async fn create_pool(config: &PoolConfig) -> Result<PgPool, StorageError> {
    let options = config.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
    info!(
        max_connections = config.max_connections,
        statement_timeout_ms = config.statement_timeout.as_millis(),
        "domain mapping database pool created"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_database_section() {
        let database = DatabaseConfig {
            url: "postgres://db/identity".to_string(),
            max_connections: 4,
            min_connections: 2,
            connect_timeout_secs: 5,
        };
        let config = PoolConfig::from(&database);
        assert_eq!(config.url, "postgres://db/identity");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.statement_timeout, Duration::from_secs(5));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = PoolConfig::new("postgres://localhost/test")
            .max_connections(20)
            .statement_timeout(Duration::from_millis(250));
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.statement_timeout, Duration::from_millis(250));
        assert!(config.connect_options().is_ok());
    }

    #[test]
    fn malformed_url_is_a_connection_error() {
        let err = PoolConfig::new("not a url").connect_options().unwrap_err();
        assert!(err.is_database_error());
    }
}
