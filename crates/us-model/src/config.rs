//! User store and realm configuration records.
//!
//! A [`RealmConfig`] lists the primary store followed by the secondary
//! stores in chain order. The XML realm loader of older deployments is not
//! part of this crate; configurations are built in code or read from TOML.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use us_core::TenantId;

use crate::domain::DomainName;
use crate::error::{ModelError, ModelResult};

/// Configuration of a single user store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStoreConfig {
    /// Domain owning this store. Required for secondaries.
    #[serde(default)]
    pub domain_name: Option<DomainName>,

    /// Identifier of the factory that builds the manager (e.g. "jdbc",
    /// "read-only-ldap"). Absent on the primary means write operations are
    /// unavailable.
    #[serde(default)]
    pub store_type: Option<String>,

    /// Whether this record describes the primary store.
    #[serde(default)]
    pub primary: bool,

    /// Disabled stores stay visible in configuration but serve no requests.
    #[serde(default)]
    pub disabled: bool,

    /// Store-specific properties (connection URL, search bases, ...).
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl UserStoreConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> UserStoreConfigBuilder {
        UserStoreConfigBuilder::default()
    }

    /// Parses a single store configuration from TOML.
    ///
    /// ## Errors
    ///
    /// Returns `ModelError::InvalidConfig` if the document does not parse.
    pub fn from_toml_str(content: &str) -> ModelResult<Self> {
        toml::from_str(content).map_err(|e| ModelError::InvalidConfig(e.to_string()))
    }

    /// Domain used to index this store.
    ///
    /// The primary store falls back to [`DomainName::PRIMARY`].
    #[must_use]
    pub fn effective_domain(&self) -> Option<DomainName> {
        match &self.domain_name {
            Some(domain) => Some(domain.clone()),
            None if self.primary => Some(DomainName::primary()),
            None => None,
        }
    }

    /// Gets a property value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Gets a property value as bool.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.properties.get(key).and_then(|v| v.parse().ok())
    }
}

/// Builder for [`UserStoreConfig`].
#[derive(Debug, Default)]
pub struct UserStoreConfigBuilder {
    inner: UserStoreConfig,
}

impl UserStoreConfigBuilder {
    /// Sets the domain.
    #[must_use]
    pub fn domain(mut self, domain: DomainName) -> Self {
        self.inner.domain_name = Some(domain);
        self
    }

    /// Sets the factory identifier.
    #[must_use]
    pub fn store_type(mut self, store_type: impl Into<String>) -> Self {
        self.inner.store_type = Some(store_type.into());
        self
    }

    /// Marks the store as primary.
    #[must_use]
    pub const fn primary(mut self, primary: bool) -> Self {
        self.inner.primary = primary;
        self
    }

    /// Marks the store as disabled.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.inner.disabled = disabled;
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.properties.insert(key.into(), value.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> UserStoreConfig {
        self.inner
    }
}

/// Configuration of a realm: its primary store, ordered secondaries, and
/// authorization manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Tenant owning the realm.
    pub tenant_id: TenantId,

    /// Primary user store. Always the head of the chain.
    pub primary: UserStoreConfig,

    /// Secondary user stores in chain order.
    #[serde(default)]
    pub secondaries: Vec<UserStoreConfig>,

    /// Factory identifier of the authorization manager. Mandatory.
    #[serde(default)]
    pub authorization_manager: Option<String>,

    /// Realm-wide properties handed to every store factory.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl RealmConfig {
    /// Creates a realm configuration with only a primary store.
    #[must_use]
    pub fn new(tenant_id: TenantId, mut primary: UserStoreConfig) -> Self {
        primary.primary = true;
        Self {
            tenant_id,
            primary,
            secondaries: Vec::new(),
            authorization_manager: None,
            properties: HashMap::new(),
        }
    }

    /// Appends a secondary store.
    #[must_use]
    pub fn with_secondary(mut self, secondary: UserStoreConfig) -> Self {
        self.secondaries.push(secondary);
        self
    }

    /// Sets the authorization manager factory identifier.
    #[must_use]
    pub fn with_authorization_manager(mut self, id: impl Into<String>) -> Self {
        self.authorization_manager = Some(id.into());
        self
    }

    /// Parses a realm configuration from TOML.
    ///
    /// ## Errors
    ///
    /// Returns `ModelError::InvalidConfig` if the document does not parse.
    pub fn from_toml_str(content: &str) -> ModelResult<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| ModelError::InvalidConfig(e.to_string()))?;
        config.primary.primary = true;
        Ok(config)
    }
}
