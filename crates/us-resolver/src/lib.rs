//! # us-resolver
//!
//! Resolution of "which domain owns this unique ID".
//!
//! A [`UniqueIdDomainResolver`] combines a [`us_cache::DomainResolverCache`]
//! with a [`us_storage::DomainMappingStore`]. Lookups go to the cache first
//! and fall back to the table, seeding the cache on the way out. Writes go
//! to the table first (unless the owning store has no stable IDs) and then
//! overwrite the cache.
//!
//! User and group resolvers are two instances of the same type, each with
//! its own cache name and table.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod resolver;

pub use error::{ResolverError, ResolverResult};
pub use resolver::UniqueIdDomainResolver;
