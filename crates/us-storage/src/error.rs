//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        /// Type of entity (e.g., "User", "Role").
        entity_type: &'static str,
        /// Entity name or unique ID.
        id: String,
    },

    /// Duplicate entity (unique constraint violation).
    #[error("Duplicate {entity_type}: {field} '{value}' already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Field that caused the conflict.
        field: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// Write attempted on a read-only store.
    #[error("User store '{0}' is read-only")]
    ReadOnly(String),

    /// Operation not offered by this store.
    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    /// Invalid data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Database query error.
    #[error("Database query error: {0}")]
    Query(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Internal error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error for an entity.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(
        entity_type: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity_type,
            field,
            value: value.into(),
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Checks if the backing database failed, as opposed to bad input.
    #[must_use]
    pub const fn is_database_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Query(_) | Self::Transaction(_)
        )
    }
}

impl From<us_model::ModelError> for StorageError {
    fn from(err: us_model::ModelError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
