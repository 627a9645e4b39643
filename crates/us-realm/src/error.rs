//! Realm error types.

use std::path::PathBuf;

use thiserror::Error;
use us_model::DomainName;
use us_resolver::ResolverError;
use us_storage::StorageError;

/// Errors raised while assembling, querying or editing a realm's chain.
#[derive(Debug, Error)]
pub enum RealmError {
    /// The primary user store could not be created. The realm is unusable.
    #[error("Primary user store '{domain}' unavailable: {source}")]
    PrimaryStoreUnavailable {
        /// Domain of the primary store.
        domain: String,
        /// Factory error.
        #[source]
        source: StorageError,
    },

    /// A secondary user store could not be created.
    #[error("Secondary user store '{domain}' unavailable: {reason}")]
    SecondaryStoreUnavailable {
        /// Domain of the secondary store.
        domain: DomainName,
        /// Why creation failed.
        reason: String,
    },

    /// No factory is registered for the configured store type.
    #[error("Unknown user store type: {0}")]
    UnknownStoreType(String),

    /// The realm configuration names no authorization manager.
    #[error("Realm configuration does not name an authorization manager")]
    MissingAuthorizationManager,

    /// The authorization manager could not be created.
    #[error("Authorization manager '{id}' unavailable: {source}")]
    AuthorizationManagerUnavailable {
        /// Factory identifier.
        id: String,
        /// Factory error.
        #[source]
        source: StorageError,
    },

    /// A secondary user store configuration has no domain name.
    #[error("User store configuration has no domain name")]
    MissingDomainName,

    /// A domain name is blank or malformed.
    #[error("Invalid domain name: '{0}'")]
    InvalidDomainName(String),

    /// The primary user store cannot be removed from the chain.
    #[error("Cannot remove the primary user store '{0}'")]
    CannotRemovePrimary(DomainName),

    /// A user store file could not be deployed or undeployed.
    #[error("Deployment of {path:?} failed: {reason}")]
    Deployment {
        /// File being deployed.
        path: PathBuf,
        /// Why deployment failed.
        reason: String,
    },

    /// Domain resolution failed.
    #[error("Domain resolution error: {0}")]
    Resolver(#[from] ResolverError),

    /// A user store operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RealmError {
    /// Creates a deployment error.
    #[must_use]
    pub fn deployment(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Deployment {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Checks if this error leaves the realm unusable.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PrimaryStoreUnavailable { .. }
                | Self::MissingAuthorizationManager
                | Self::AuthorizationManagerUnavailable { .. }
        )
    }

    /// Checks if this error was caused by configuration input.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownStoreType(_)
                | Self::MissingAuthorizationManager
                | Self::MissingDomainName
                | Self::InvalidDomainName(_)
                | Self::CannotRemovePrimary(_)
        )
    }
}

/// Result type for realm operations.
pub type RealmResult<T> = Result<T, RealmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        let primary = RealmError::PrimaryStoreUnavailable {
            domain: "PRIMARY".to_string(),
            source: StorageError::Connection("refused".to_string()),
        };
        assert!(primary.is_fatal());
        assert!(!primary.is_configuration_error());

        assert!(RealmError::MissingAuthorizationManager.is_fatal());
        assert!(RealmError::UnknownStoreType("ldap".into()).is_configuration_error());
        assert!(!RealmError::MissingDomainName.is_fatal());
    }

    #[test]
    fn deployment_error_names_file() {
        let err = RealmError::deployment("/opt/userstores/ldap_example.toml", "bad toml");
        assert!(err.to_string().contains("ldap_example.toml"));
        assert!(err.to_string().contains("bad toml"));
    }
}
