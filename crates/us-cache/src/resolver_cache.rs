//! Tenant-scoped cache used by the unique ID domain resolvers.
//!
//! Every call enters the tenant scope before touching the provider and
//! leaves it when the call returns. Invalid input, a missing cache and
//! provider failures all behave like a miss; nothing here returns an error.

use std::sync::Arc;

use tracing::debug;
use us_core::{TenantContext, TenantId};

use crate::provider::{Cache, CacheManager};

/// Facade over a [`CacheManager`] for `entity id -> domain` entries.
#[derive(Clone)]
pub struct DomainResolverCache {
    manager: Arc<dyn CacheManager>,
}

impl std::fmt::Debug for DomainResolverCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainResolverCache").finish_non_exhaustive()
    }
}

impl DomainResolverCache {
    /// Creates a cache facade over `manager`.
    #[must_use]
    pub fn new(manager: Arc<dyn CacheManager>) -> Self {
        Self { manager }
    }

    /// Resolves the named cache; must be called inside the tenant scope.
    async fn cache(&self, cache_name: &str) -> Option<Arc<dyn Cache>> {
        match self.manager.get_cache(cache_name).await {
            Ok(Some(cache)) => Some(cache),
            Ok(None) => {
                debug!(cache_name, "cache provider has no cache with this name");
                None
            }
            Err(e) => {
                debug!(cache_name, error = %e, "cache provider lookup failed");
                None
            }
        }
    }

    /// Stores `value` under `key` unless the key is already present.
    ///
    /// The first writer wins; a racing second value is dropped.
    pub async fn put(&self, cache_name: &str, tenant: TenantId, key: &str, value: &str) {
        if cache_name.is_empty() || key.is_empty() || value.is_empty() {
            debug!(cache_name, key, "skipping cache put with empty input");
            return;
        }
        TenantContext::scope(tenant, async {
            let Some(cache) = self.cache(cache_name).await else {
                return;
            };
            match cache.put_if_absent(key, value).await {
                Ok(true) => debug!(cache_name, tenant_id = %tenant, key, value, "cache entry added"),
                Ok(false) => debug!(cache_name, tenant_id = %tenant, key, "cache entry already present"),
                Err(e) => debug!(cache_name, tenant_id = %tenant, key, error = %e, "cache put failed"),
            }
        })
        .await;
    }

    /// Stores `value` under `key`, replacing any existing entry.
    pub async fn put_overwrite(&self, cache_name: &str, tenant: TenantId, key: &str, value: &str) {
        if cache_name.is_empty() || key.is_empty() || value.is_empty() {
            debug!(cache_name, key, "skipping cache put with empty input");
            return;
        }
        TenantContext::scope(tenant, async {
            let Some(cache) = self.cache(cache_name).await else {
                return;
            };
            if let Err(e) = cache.put(key, value).await {
                debug!(cache_name, tenant_id = %tenant, key, error = %e, "cache overwrite failed");
            }
        })
        .await;
    }

    /// Looks up `key`.
    ///
    /// Returns `None` on invalid input, missing cache, provider failure or
    /// miss.
    pub async fn get(&self, cache_name: &str, tenant: TenantId, key: &str) -> Option<String> {
        if cache_name.is_empty() || key.is_empty() {
            return None;
        }
        TenantContext::scope(tenant, async {
            let cache = self.cache(cache_name).await?;
            match cache.get(key).await {
                Ok(Some(value)) => Some(value),
                Ok(None) => {
                    debug!(cache_name, tenant_id = %tenant, key, "cache miss");
                    None
                }
                Err(e) => {
                    debug!(cache_name, tenant_id = %tenant, key, error = %e, "cache get failed");
                    None
                }
            }
        })
        .await
    }

    /// Removes `key`. Removing an absent key is a no-op.
    pub async fn remove(&self, cache_name: &str, tenant: TenantId, key: &str) {
        if cache_name.is_empty() || key.is_empty() {
            return;
        }
        TenantContext::scope(tenant, async {
            let Some(cache) = self.cache(cache_name).await else {
                return;
            };
            if let Err(e) = cache.remove(key).await {
                debug!(cache_name, tenant_id = %tenant, key, error = %e, "cache remove failed");
            }
        })
        .await;
    }

    /// Empties the named cache of `tenant`.
    pub async fn clear(&self, cache_name: &str, tenant: TenantId) {
        if cache_name.is_empty() {
            return;
        }
        TenantContext::scope(tenant, async {
            let Some(cache) = self.cache(cache_name).await else {
                return;
            };
            if let Err(e) = cache.remove_all().await {
                debug!(cache_name, tenant_id = %tenant, error = %e, "cache clear failed");
            }
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCacheManager;

    const CACHE: &str = "user_unique_id_domain_cache";

    fn setup() -> (Arc<InMemoryCacheManager>, DomainResolverCache) {
        let manager = Arc::new(InMemoryCacheManager::new());
        let cache = DomainResolverCache::new(manager.clone());
        (manager, cache)
    }

    #[tokio::test]
    async fn first_write_wins() {
        let (_, cache) = setup();
        cache.put(CACHE, TenantId(1), "u-1", "LDAP").await;
        cache.put(CACHE, TenantId(1), "u-1", "JDBC").await;
        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await.as_deref(), Some("LDAP"));

        cache.put_overwrite(CACHE, TenantId(1), "u-1", "JDBC").await;
        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await.as_deref(), Some("JDBC"));
    }

    #[tokio::test]
    async fn empty_inputs_are_ignored() {
        let (manager, cache) = setup();
        cache.put(CACHE, TenantId(1), "", "LDAP").await;
        cache.put(CACHE, TenantId(1), "u-1", "").await;
        cache.put("", TenantId(1), "u-1", "LDAP").await;

        assert!(manager.cache_for(TenantId(1), CACHE).is_none());
        assert_eq!(cache.get(CACHE, TenantId(1), "").await, None);
    }

    #[tokio::test]
    async fn tenants_do_not_share_entries() {
        let (_, cache) = setup();
        cache.put(CACHE, TenantId(1), "u-1", "LDAP").await;
        cache.put(CACHE, TenantId(2), "u-1", "JDBC").await;

        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await.as_deref(), Some("LDAP"));
        assert_eq!(cache.get(CACHE, TenantId(2), "u-1").await.as_deref(), Some("JDBC"));

        cache.clear(CACHE, TenantId(1)).await;
        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await, None);
        assert_eq!(cache.get(CACHE, TenantId(2), "u-1").await.as_deref(), Some("JDBC"));
    }

    #[tokio::test]
    async fn missing_or_failing_provider_is_a_miss() {
        let (manager, cache) = setup();
        cache.put(CACHE, TenantId(1), "u-1", "LDAP").await;

        manager.disable_cache(CACHE);
        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await, None);
        cache.put(CACHE, TenantId(1), "u-2", "LDAP").await;
        manager.enable_cache(CACHE);
        assert_eq!(cache.get(CACHE, TenantId(1), "u-2").await, None);

        manager.set_unavailable(true);
        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await, None);
        cache.remove(CACHE, TenantId(1), "u-1").await;
        manager.set_unavailable(false);
        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await.as_deref(), Some("LDAP"));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_, cache) = setup();
        cache.put(CACHE, TenantId(1), "u-1", "LDAP").await;
        cache.remove(CACHE, TenantId(1), "u-1").await;
        cache.remove(CACHE, TenantId(1), "u-1").await;
        assert_eq!(cache.get(CACHE, TenantId(1), "u-1").await, None);
    }

    #[tokio::test]
    async fn tenant_scope_is_exited_after_each_call() {
        let (_, cache) = setup();
        cache.put(CACHE, TenantId(5), "u-1", "LDAP").await;
        assert_eq!(TenantContext::current(), None);
    }
}
