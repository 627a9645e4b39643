//! Cache provider traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CacheResult;

/// A named string-to-string cache.
///
/// Implementations must be thread-safe, and every single-key operation must
/// be atomic: readers never observe a partially written value.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Sets a value, replacing any existing one.
    async fn put(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Sets a value only if the key doesn't exist.
    ///
    /// Returns `true` if the value was set, `false` if the key already existed.
    async fn put_if_absent(&self, key: &str, value: &str) -> CacheResult<bool>;

    /// Deletes a value from the cache.
    ///
    /// Returns `Ok(())` even if the key doesn't exist.
    async fn remove(&self, key: &str) -> CacheResult<()>;

    /// Deletes every entry in the cache.
    async fn remove_all(&self) -> CacheResult<()>;
}

/// Resolves named caches in the namespace of the current tenant.
#[async_trait]
pub trait CacheManager: Send + Sync {
    /// Gets the cache called `name` for the tenant in
    /// [`us_core::TenantContext::current`].
    ///
    /// Returns `Ok(None)` when the provider has no such cache.
    ///
    /// ## Errors
    ///
    /// Returns `CacheError::NoTenantContext` when called outside a tenant
    /// scope, or a provider error.
    async fn get_cache(&self, name: &str) -> CacheResult<Option<Arc<dyn Cache>>>;
}
