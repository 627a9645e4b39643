//! # us-storage
//!
//! Storage capability traits for the user-store subsystem.
//!
//! Concrete directories (JDBC, LDAP, ...) are opaque behind these traits;
//! the chain and the resolvers only ever talk to them.
//!
//! ## Capability Traits
//!
//! - [`UserStoreManager`] - authentication, user CRUD, claims and roles for
//!   one domain
//! - [`AuthorizationManager`] - permission checks for a realm
//! - [`DomainMappingStore`] - the persisted `unique ID -> domain` table
//!
//! ## In-memory Implementations
//!
//! [`memory`] provides process-local versions of all three, used by tests
//! and by embedded deployments without a database.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod authz;
pub mod error;
pub mod manager;
pub mod mapping;
pub mod memory;

pub use authz::AuthorizationManager;
pub use error::{StorageError, StorageResult};
pub use manager::UserStoreManager;
pub use mapping::DomainMappingStore;
pub use memory::{
    InMemoryAuthorizationManager, InMemoryDomainMappingStore, InMemoryUserStoreManager,
};
