//! # us-storage-sql
//!
//! SQLx-based storage for the user-store subsystem.
//!
//! This crate provides the `PostgreSQL` domain mapping tables behind
//! [`us_storage::DomainMappingStore`]:
//!
//! - `um_domain` - tenant-scoped domain names
//! - `um_uuid_domain_mapper` - user unique ID to domain
//! - `um_group_uuid_domain_mapper` - group unique ID to domain
//!
//! Writes are single-statement upserts inside a transaction, so concurrent
//! first writes for one entity never produce two rows.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod mapping;
pub mod pool;
pub mod schema;

pub use mapping::PgDomainMappingStore;
pub use pool::{create_pool, PoolConfig};
pub use schema::run_migrations;
