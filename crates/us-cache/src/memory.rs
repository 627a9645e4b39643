//! In-memory cache provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use us_core::{TenantContext, TenantId};

use crate::error::{CacheError, CacheResult};
use crate::provider::{Cache, CacheManager};

/// A process-local cache.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, String>,
}

impl InMemoryCache {
    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> CacheResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, value: &str) -> CacheResult<bool> {
        let mut inserted = false;
        self.entries.entry(key.to_string()).or_insert_with(|| {
            inserted = true;
            value.to_string()
        });
        Ok(inserted)
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_all(&self) -> CacheResult<()> {
        self.entries.clear();
        Ok(())
    }
}

/// Cache manager keeping one [`InMemoryCache`] per `(tenant, name)`.
///
/// Caches are created on first use. Names can be disabled to model a
/// provider that has no cache configured under that name.
#[derive(Debug, Default)]
pub struct InMemoryCacheManager {
    caches: DashMap<(TenantId, String), Arc<InMemoryCache>>,
    disabled: DashSet<String>,
    unavailable: AtomicBool,
}

impl InMemoryCacheManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `get_cache(name)` return no cache.
    pub fn disable_cache(&self, name: impl Into<String>) {
        self.disabled.insert(name.into());
    }

    /// Re-enables a cache name.
    pub fn enable_cache(&self, name: &str) {
        self.disabled.remove(name);
    }

    /// Makes every lookup fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the cache of `tenant` called `name`, if it was ever created.
    #[must_use]
    pub fn cache_for(&self, tenant: TenantId, name: &str) -> Option<Arc<InMemoryCache>> {
        self.caches
            .get(&(tenant, name.to_string()))
            .map(|c| Arc::clone(c.value()))
    }
}

#[async_trait]
impl CacheManager for InMemoryCacheManager {
    async fn get_cache(&self, name: &str) -> CacheResult<Option<Arc<dyn Cache>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("cache provider unavailable".to_string()));
        }
        if self.disabled.contains(name) {
            return Ok(None);
        }
        let tenant = TenantContext::current().ok_or(CacheError::NoTenantContext)?;
        let cache: Arc<dyn Cache> = self
            .caches
            .entry((tenant, name.to_string()))
            .or_default()
            .value()
            .clone();
        Ok(Some(cache))
    }
}
