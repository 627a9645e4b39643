//! Model validation errors.

use thiserror::Error;

/// Errors raised while constructing or parsing model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Domain name is empty or contains a reserved character.
    #[error("invalid domain name '{0}'")]
    InvalidDomainName(String),

    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
