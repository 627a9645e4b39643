//! Error handling for the user-store subsystem.
//!
//! Crate-specific errors (storage, resolver, realm) live next to the code that
//! raises them. This type covers configuration loading and process wiring,
//! where callers only need a coarse classification.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for configuration and wiring.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// Cache error.
    #[error("cache error: {0}")]
    Cache(String),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    /// Internal error.
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Cache(_) | Self::Io { .. } | Self::Internal
        )
    }

    /// Returns whether this error was caused by bad input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Validation(_) | Self::NotFound(_) | Self::AlreadyExists(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_is_generic() {
        let error = Error::Internal;
        assert_eq!(error.to_string(), "internal error");
        assert!(error.is_server_error());
    }

    #[test]
    fn config_error_is_client_error() {
        let error = Error::config("missing primary store");
        assert!(error.is_client_error());
        assert!(!error.is_server_error());
        assert!(error.to_string().contains("missing primary store"));
    }

    #[test]
    fn io_error_keeps_path() {
        let error = Error::Io {
            path: "/etc/userstore.toml".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(error.is_server_error());
        assert!(error.to_string().contains("/etc/userstore.toml"));
    }
}
