//! Unique ID to domain resolver.

use std::sync::Arc;

use tracing::{debug, warn};
use us_cache::DomainResolverCache;
use us_core::config::{CacheConfig, DEFAULT_GROUP_CACHE_NAME, DEFAULT_USER_CACHE_NAME};
use us_core::event::{Event, EventType};
use us_core::TenantId;
use us_model::{DomainName, EntityKind};
use us_storage::DomainMappingStore;

use crate::error::{ResolverError, ResolverResult};

/// Resolves and records the domain owning a user or group unique ID.
#[derive(Clone)]
pub struct UniqueIdDomainResolver {
    kind: EntityKind,
    cache_name: String,
    cache: DomainResolverCache,
    store: Arc<dyn DomainMappingStore>,
}

impl std::fmt::Debug for UniqueIdDomainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniqueIdDomainResolver")
            .field("kind", &self.kind)
            .field("cache_name", &self.cache_name)
            .finish_non_exhaustive()
    }
}

impl UniqueIdDomainResolver {
    /// Creates a resolver for `store.kind()` entities using `cache_name`.
    #[must_use]
    pub fn new(
        cache_name: impl Into<String>,
        cache: DomainResolverCache,
        store: Arc<dyn DomainMappingStore>,
    ) -> Self {
        Self {
            kind: store.kind(),
            cache_name: cache_name.into(),
            cache,
            store,
        }
    }

    /// Creates the user resolver with the default cache name.
    #[must_use]
    pub fn for_users(cache: DomainResolverCache, store: Arc<dyn DomainMappingStore>) -> Self {
        debug_assert_eq!(store.kind(), EntityKind::User);
        Self::new(DEFAULT_USER_CACHE_NAME, cache, store)
    }

    /// Creates the group resolver with the default cache name.
    #[must_use]
    pub fn for_groups(cache: DomainResolverCache, store: Arc<dyn DomainMappingStore>) -> Self {
        debug_assert_eq!(store.kind(), EntityKind::Group);
        Self::new(DEFAULT_GROUP_CACHE_NAME, cache, store)
    }

    /// Creates a resolver taking its cache name from configuration.
    #[must_use]
    pub fn from_config(
        config: &CacheConfig,
        cache: DomainResolverCache,
        store: Arc<dyn DomainMappingStore>,
    ) -> Self {
        let cache_name = match store.kind() {
            EntityKind::User => config.user_cache_name.clone(),
            EntityKind::Group => config.group_cache_name.clone(),
        };
        Self::new(cache_name, cache, store)
    }

    /// Entity kind this resolver maps.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Cache name this resolver writes to.
    #[must_use]
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    fn persistence_error(
        &self,
        entity_id: &str,
        tenant: TenantId,
        source: us_storage::StorageError,
    ) -> ResolverError {
        ResolverError::persistence(self.kind, entity_id, tenant, source)
    }

    /// Returns the domain owning `entity_id`, or `None` if no mapping exists.
    ///
    /// The cache is consulted first. On a miss the table is read and a hit is
    /// written back to the cache without overwriting a concurrent writer.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidArgument` for an empty ID and `Persistence` if the
    /// table read fails.
    pub async fn get_domain(
        &self,
        entity_id: &str,
        tenant: TenantId,
    ) -> ResolverResult<Option<DomainName>> {
        if entity_id.is_empty() {
            return Err(ResolverError::invalid_argument(format!(
                "{} unique ID cannot be empty",
                self.kind
            )));
        }

        if let Some(cached) = self.cache.get(&self.cache_name, tenant, entity_id).await {
            match DomainName::new(&cached) {
                Ok(domain) => return Ok(Some(domain)),
                Err(_) => warn!(
                    cache_name = %self.cache_name,
                    entity_id,
                    value = %cached,
                    "ignoring malformed cached domain"
                ),
            }
        }

        let stored = self
            .store
            .get(entity_id, tenant)
            .await
            .map_err(|e| self.persistence_error(entity_id, tenant, e))?;

        match stored {
            Some(domain) => {
                debug!(
                    kind = %self.kind,
                    entity_id,
                    tenant_id = %tenant,
                    domain = %domain,
                    "domain resolved from mapping table"
                );
                self.cache
                    .put(&self.cache_name, tenant, entity_id, domain.as_str())
                    .await;
                Ok(Some(domain))
            }
            None => {
                debug!(kind = %self.kind, entity_id, tenant_id = %tenant, "no domain mapping");
                Ok(None)
            }
        }
    }

    /// Records that `domain` owns `entity_id`.
    ///
    /// Unless `persist_only_to_cache` is set, the table is upserted first;
    /// the cache entry is then overwritten.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidArgument` for an empty ID or domain and `Persistence`
    /// if the upsert fails. The cache is left untouched on failure.
    pub async fn set_domain(
        &self,
        entity_id: &str,
        domain: &str,
        tenant: TenantId,
        persist_only_to_cache: bool,
    ) -> ResolverResult<()> {
        if entity_id.is_empty() {
            return Err(ResolverError::invalid_argument(format!(
                "{} unique ID cannot be empty",
                self.kind
            )));
        }
        let domain = DomainName::new(domain)
            .map_err(|e| ResolverError::invalid_argument(e.to_string()))?;

        if !persist_only_to_cache {
            if let Err(e) = self.store.upsert(entity_id, tenant, &domain).await {
                Event::builder(EventType::DomainMappingUpdated)
                    .tenant(tenant)
                    .domain(domain.as_str())
                    .entity(entity_id)
                    .failure(e.to_string())
                    .build()
                    .emit();
                return Err(self.persistence_error(entity_id, tenant, e));
            }
        }

        self.cache
            .put_overwrite(&self.cache_name, tenant, entity_id, domain.as_str())
            .await;

        Event::builder(EventType::DomainMappingUpdated)
            .tenant(tenant)
            .domain(domain.as_str())
            .entity(entity_id)
            .detail("kind", self.kind.as_str())
            .detail("persisted", (!persist_only_to_cache).to_string())
            .build()
            .emit();
        Ok(())
    }

    /// Removes the mapping of `entity_id` to `domain`.
    ///
    /// The cache entry is always evicted. Unless `clear_only_cache` is set,
    /// the row is deleted when it points at `domain`.
    ///
    /// ## Errors
    ///
    /// Returns `DomainMismatch` if the row names another domain (the row is
    /// kept), `InvalidArgument` for empty input and `Persistence` on table
    /// failures.
    pub async fn remove_domain(
        &self,
        entity_id: &str,
        domain: &str,
        tenant: TenantId,
        clear_only_cache: bool,
    ) -> ResolverResult<()> {
        if entity_id.is_empty() {
            return Err(ResolverError::invalid_argument(format!(
                "{} unique ID cannot be empty",
                self.kind
            )));
        }
        let domain = DomainName::new(domain)
            .map_err(|e| ResolverError::invalid_argument(e.to_string()))?;

        self.cache.remove(&self.cache_name, tenant, entity_id).await;
        if clear_only_cache {
            return Ok(());
        }

        let stored = self
            .store
            .get(entity_id, tenant)
            .await
            .map_err(|e| self.persistence_error(entity_id, tenant, e))?;
        let Some(stored) = stored else {
            return Ok(());
        };
        if stored != domain {
            return Err(ResolverError::DomainMismatch {
                entity_id: entity_id.to_string(),
                requested: domain,
                stored,
            });
        }

        self.store
            .delete(entity_id, tenant, &domain)
            .await
            .map_err(|e| self.persistence_error(entity_id, tenant, e))?;

        Event::builder(EventType::DomainMappingRemoved)
            .tenant(tenant)
            .domain(domain.as_str())
            .entity(entity_id)
            .detail("kind", self.kind.as_str())
            .build()
            .emit();
        Ok(())
    }

    /// Drops every trace of a mapping, whatever domain it names.
    ///
    /// Used when a mapping points at a domain that has left the chain.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidArgument` for an empty ID and `Persistence` if the
    /// delete fails.
    pub async fn evict(&self, entity_id: &str, tenant: TenantId) -> ResolverResult<()> {
        if entity_id.is_empty() {
            return Err(ResolverError::invalid_argument(format!(
                "{} unique ID cannot be empty",
                self.kind
            )));
        }
        self.cache.remove(&self.cache_name, tenant, entity_id).await;
        let deleted = self
            .store
            .delete_any(entity_id, tenant)
            .await
            .map_err(|e| self.persistence_error(entity_id, tenant, e))?;

        Event::builder(EventType::StaleDomainMappingEvicted)
            .tenant(tenant)
            .entity(entity_id)
            .detail("kind", self.kind.as_str())
            .detail("row_deleted", deleted.to_string())
            .build()
            .emit();
        Ok(())
    }

    /// Empties this resolver's cache for `tenant`.
    ///
    /// The table is untouched; later lookups repopulate the cache from it.
    pub async fn clear_cache(&self, tenant: TenantId) {
        self.cache.clear(&self.cache_name, tenant).await;
    }
}
