//! Registry of user store and authorization manager factories.
//!
//! Store configurations name a `store_type`; the registry maps that
//! identifier to a factory with one fixed construction signature. An
//! identifier nobody registered fails with [`RealmError::UnknownStoreType`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use us_core::TenantId;
use us_model::{RealmConfig, UserStoreConfig};
use us_storage::{
    AuthorizationManager, InMemoryAuthorizationManager, InMemoryUserStoreManager, StorageResult,
    UserStoreManager,
};

use crate::error::{RealmError, RealmResult};

/// Realm-level context handed to every factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreContext {
    /// Tenant owning the realm.
    pub tenant_id: TenantId,
    /// Realm-wide properties.
    pub realm_properties: HashMap<String, String>,
}

impl StoreContext {
    /// Creates a context for `tenant_id` without properties.
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            realm_properties: HashMap::new(),
        }
    }
}

impl From<&RealmConfig> for StoreContext {
    fn from(config: &RealmConfig) -> Self {
        Self {
            tenant_id: config.tenant_id,
            realm_properties: config.properties.clone(),
        }
    }
}

/// Builds user store managers of one store type.
#[async_trait]
pub trait UserStoreFactory: Send + Sync {
    /// Store type identifier this factory is registered under.
    fn store_type(&self) -> &str;

    /// Creates a manager for `config`.
    ///
    /// ## Errors
    ///
    /// Returns a storage error if the backing directory is unreachable or
    /// the configuration is unusable.
    async fn create(
        &self,
        config: &UserStoreConfig,
        context: &StoreContext,
    ) -> StorageResult<Arc<dyn UserStoreManager>>;
}

/// Builds authorization managers.
#[async_trait]
pub trait AuthorizationManagerFactory: Send + Sync {
    /// Identifier this factory is registered under.
    fn id(&self) -> &str;

    /// Creates an authorization manager for the realm.
    ///
    /// ## Errors
    ///
    /// Returns a storage error if the manager cannot be created.
    async fn create(&self, context: &StoreContext) -> StorageResult<Arc<dyn AuthorizationManager>>;
}

type CreateFn = dyn Fn(&UserStoreConfig, &StoreContext) -> StorageResult<Arc<dyn UserStoreManager>>
    + Send
    + Sync;

/// A [`UserStoreFactory`] backed by a closure.
pub struct FnStoreFactory {
    store_type: String,
    create: Box<CreateFn>,
}

impl FnStoreFactory {
    /// Wraps `create` as the factory for `store_type`.
    pub fn new<F>(store_type: impl Into<String>, create: F) -> Self
    where
        F: Fn(&UserStoreConfig, &StoreContext) -> StorageResult<Arc<dyn UserStoreManager>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            store_type: store_type.into(),
            create: Box::new(create),
        }
    }
}

impl std::fmt::Debug for FnStoreFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStoreFactory")
            .field("store_type", &self.store_type)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UserStoreFactory for FnStoreFactory {
    fn store_type(&self) -> &str {
        &self.store_type
    }

    async fn create(
        &self,
        config: &UserStoreConfig,
        context: &StoreContext,
    ) -> StorageResult<Arc<dyn UserStoreManager>> {
        (self.create)(config, context)
    }
}

/// Factory for [`InMemoryUserStoreManager`], registered as `memory`.
///
/// The property `UniqueIdSupported = false` builds a store whose IDs are
/// not stable.
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryStoreFactory;

impl InMemoryStoreFactory {
    /// Store type identifier.
    pub const STORE_TYPE: &'static str = "memory";

    /// Store property disabling stable unique IDs.
    pub const PROPERTY_UNIQUE_ID: &'static str = "UniqueIdSupported";
}

#[async_trait]
impl UserStoreFactory for InMemoryStoreFactory {
    fn store_type(&self) -> &str {
        Self::STORE_TYPE
    }

    async fn create(
        &self,
        config: &UserStoreConfig,
        context: &StoreContext,
    ) -> StorageResult<Arc<dyn UserStoreManager>> {
        let unique_ids = config.get_bool(Self::PROPERTY_UNIQUE_ID).unwrap_or(true);
        Ok(Arc::new(
            InMemoryUserStoreManager::new(config.clone(), context.tenant_id)
                .with_unique_id_support(unique_ids),
        ))
    }
}

/// Factory for [`InMemoryAuthorizationManager`], registered as `memory`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemoryAuthorizationFactory;

impl InMemoryAuthorizationFactory {
    /// Factory identifier.
    pub const ID: &'static str = "memory";
}

#[async_trait]
impl AuthorizationManagerFactory for InMemoryAuthorizationFactory {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn create(&self, context: &StoreContext) -> StorageResult<Arc<dyn AuthorizationManager>> {
        Ok(Arc::new(InMemoryAuthorizationManager::new(context.tenant_id)))
    }
}

/// Registry of store and authorization factories keyed by identifier.
#[derive(Default)]
pub struct StoreFactoryRegistry {
    stores: DashMap<String, Arc<dyn UserStoreFactory>>,
    authorization: DashMap<String, Arc<dyn AuthorizationManagerFactory>>,
}

impl std::fmt::Debug for StoreFactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreFactoryRegistry")
            .field("store_types", &self.store_types())
            .finish_non_exhaustive()
    }
}

impl StoreFactoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the in-memory factories registered.
    #[must_use]
    pub fn with_in_memory() -> Self {
        let registry = Self::new();
        registry.register_store(InMemoryStoreFactory);
        registry.register_authorization(InMemoryAuthorizationFactory);
        registry
    }

    /// Registers a store factory, replacing any factory of the same type.
    pub fn register_store<F>(&self, factory: F)
    where
        F: UserStoreFactory + 'static,
    {
        self.stores
            .insert(factory.store_type().to_string(), Arc::new(factory));
    }

    /// Registers an authorization manager factory.
    pub fn register_authorization<F>(&self, factory: F)
    where
        F: AuthorizationManagerFactory + 'static,
    {
        self.authorization
            .insert(factory.id().to_string(), Arc::new(factory));
    }

    /// Checks if a store type is registered.
    #[must_use]
    pub fn has_store_type(&self, store_type: &str) -> bool {
        self.stores.contains_key(store_type)
    }

    /// Lists registered store types, sorted.
    #[must_use]
    pub fn store_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.stores.iter().map(|e| e.key().clone()).collect();
        types.sort();
        types
    }

    fn store_factory(&self, store_type: &str) -> RealmResult<Arc<dyn UserStoreFactory>> {
        self.stores
            .get(store_type)
            .map(|f| Arc::clone(f.value()))
            .ok_or_else(|| RealmError::UnknownStoreType(store_type.to_string()))
    }

    /// Looks up the factory for `store_type` and creates a manager.
    ///
    /// The outer result fails with `UnknownStoreType`; the inner one carries
    /// the factory's own error.
    ///
    /// ## Errors
    ///
    /// Returns `RealmError::UnknownStoreType` if nothing is registered under
    /// `store_type`.
    pub async fn create_store(
        &self,
        store_type: &str,
        config: &UserStoreConfig,
        context: &StoreContext,
    ) -> RealmResult<StorageResult<Arc<dyn UserStoreManager>>> {
        let factory = self.store_factory(store_type)?;
        Ok(factory.create(config, context).await)
    }

    /// Creates the authorization manager registered under `id`.
    ///
    /// ## Errors
    ///
    /// Returns `RealmError::UnknownStoreType` for an unregistered `id` and
    /// `RealmError::AuthorizationManagerUnavailable` if the factory fails.
    pub async fn create_authorization(
        &self,
        id: &str,
        context: &StoreContext,
    ) -> RealmResult<Arc<dyn AuthorizationManager>> {
        let factory = self
            .authorization
            .get(id)
            .map(|f| Arc::clone(f.value()))
            .ok_or_else(|| RealmError::UnknownStoreType(id.to_string()))?;
        factory
            .create(context)
            .await
            .map_err(|source| RealmError::AuthorizationManagerUnavailable {
                id: id.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use us_model::DomainName;
    use us_storage::StorageError;

    fn config(domain: &str, store_type: &str) -> UserStoreConfig {
        UserStoreConfig::builder()
            .domain(DomainName::new(domain).unwrap())
            .store_type(store_type)
            .build()
    }

    #[tokio::test]
    async fn unknown_store_type_fails_fast() {
        let registry = StoreFactoryRegistry::new();
        let result = registry
            .create_store("ldap", &config("LDAP", "ldap"), &StoreContext::new(TenantId(1)))
            .await;
        assert!(matches!(result, Err(RealmError::UnknownStoreType(t)) if t == "ldap"));
    }

    #[tokio::test]
    async fn in_memory_factories_are_registered() {
        let registry = StoreFactoryRegistry::with_in_memory();
        assert_eq!(registry.store_types(), vec!["memory".to_string()]);

        let context = StoreContext::new(TenantId(3));
        let manager = registry
            .create_store("memory", &config("LDAP", "memory"), &context)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manager.tenant_id(), TenantId(3));
        assert!(manager.is_unique_id_supported());

        let authz = registry.create_authorization("memory", &context).await.unwrap();
        assert_eq!(authz.tenant_id(), TenantId(3));
    }

    #[tokio::test]
    async fn closure_factory_errors_are_returned() {
        let registry = StoreFactoryRegistry::new();
        registry.register_store(FnStoreFactory::new("broken", |_, _| {
            Err(StorageError::Connection("ldap://down".to_string()))
        }));

        let result = registry
            .create_store("broken", &config("LDAP", "broken"), &StoreContext::new(TenantId(1)))
            .await
            .unwrap();
        assert!(matches!(result, Err(StorageError::Connection(_))));
    }

    #[tokio::test]
    async fn unique_id_support_follows_property() {
        let registry = StoreFactoryRegistry::with_in_memory();
        let config = UserStoreConfig::builder()
            .domain(DomainName::new("AD").unwrap())
            .store_type("memory")
            .property(InMemoryStoreFactory::PROPERTY_UNIQUE_ID, "false")
            .build();
        let manager = registry
            .create_store("memory", &config, &StoreContext::new(TenantId(1)))
            .await
            .unwrap()
            .unwrap();
        assert!(!manager.is_unique_id_supported());
    }
}
