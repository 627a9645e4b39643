//! Value types exchanged with user store managers.
//!
//! Users are addressed either by a domain-qualified username
//! (`DOMAIN/name`, see [`QualifiedName`]) or by a store-independent unique
//! ID. Claims are flat URI-to-value maps; dialect mapping is the caller's
//! business.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainName, DOMAIN_SEPARATOR};
use crate::error::ModelResult;

/// Claim URI to value map.
pub type Claims = HashMap<String, String>;

/// A secret presented for authentication or stored as a new credential.
///
/// The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the secret for comparison by a store.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

/// A user as returned by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-independent unique ID.
    pub user_id: String,
    /// Username inside the owning domain (not domain-qualified).
    pub username: String,
    /// Claim values.
    #[serde(default)]
    pub claims: Claims,
}

impl User {
    /// Creates a user without claims.
    #[must_use]
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            claims: Claims::new(),
        }
    }

    /// Adds a claim value.
    #[must_use]
    pub fn with_claim(mut self, uri: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(uri.into(), value.into());
        self
    }
}

/// A username, optionally prefixed by its domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Domain prefix, if the name carried one.
    pub domain: Option<DomainName>,
    /// Username without the domain prefix.
    pub name: String,
}

impl QualifiedName {
    /// Splits `DOMAIN/name` at the first separator.
    ///
    /// Names without a separator are unqualified.
    ///
    /// ## Errors
    ///
    /// Returns `ModelError::InvalidDomainName` if the prefix is blank.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        match raw.split_once(DOMAIN_SEPARATOR) {
            Some((domain, name)) => Ok(Self {
                domain: Some(DomainName::new(domain)?),
                name: name.to_string(),
            }),
            None => Ok(Self {
                domain: None,
                name: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{domain}{DOMAIN_SEPARATOR}{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
