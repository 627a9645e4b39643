//! Resolver error types.

use thiserror::Error;
use us_core::TenantId;
use us_model::{DomainName, EntityKind};
use us_storage::StorageError;

/// Errors raised by [`crate::UniqueIdDomainResolver`].
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Empty entity ID or domain name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The mapping table failed; any write was rolled back.
    #[error("failed to persist {kind} domain mapping for '{entity_id}' in tenant {tenant_id}: {source}")]
    Persistence {
        /// Entity kind of the mapping.
        kind: EntityKind,
        /// Entity unique ID.
        entity_id: String,
        /// Tenant of the entity.
        tenant_id: TenantId,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },

    /// The stored mapping points at a different domain than the caller named.
    #[error("'{entity_id}' is mapped to domain {stored}, not {requested}")]
    DomainMismatch {
        /// Entity unique ID.
        entity_id: String,
        /// Domain named by the caller.
        requested: DomainName,
        /// Domain found in the table.
        stored: DomainName,
    },
}

impl ResolverError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Wraps a storage error with the entity it concerned.
    #[must_use]
    pub fn persistence(
        kind: EntityKind,
        entity_id: impl Into<String>,
        tenant_id: TenantId,
        source: StorageError,
    ) -> Self {
        Self::Persistence {
            kind,
            entity_id: entity_id.into(),
            tenant_id,
            source,
        }
    }

    /// Checks if this is an invalid argument error.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Checks if this is a persistence error.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;
