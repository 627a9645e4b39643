//! # us-cache
//!
//! Cache abstraction for the user-store subsystem.
//!
//! Caches are named string-to-string maps living inside a tenant namespace.
//! The namespace is taken from the ambient [`us_core::TenantContext`], so the
//! same cache name used by two tenants never shares entries.
//!
//! ## Cache Providers
//!
//! - [`CacheManager`] - resolves a named [`Cache`] for the current tenant
//! - [`InMemoryCacheManager`] - process-local provider backed by `DashMap`
//!
//! ## Domain Resolution
//!
//! - [`DomainResolverCache`] - input-checked, tenant-scoped facade used by the
//!   unique ID domain resolvers; provider failures degrade to misses
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use us_cache::{DomainResolverCache, InMemoryCacheManager};
//! use us_core::TenantId;
//!
//! let cache = DomainResolverCache::new(Arc::new(InMemoryCacheManager::new()));
//! cache.put("user_unique_id_domain_cache", TenantId::SUPER, "u-1", "PRIMARY").await;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod provider;
pub mod resolver_cache;

pub use error::{CacheError, CacheResult};
pub use memory::{InMemoryCache, InMemoryCacheManager};
pub use provider::{Cache, CacheManager};
pub use resolver_cache::DomainResolverCache;
