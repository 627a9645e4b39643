//! # us-model
//!
//! Domain models for the user-store subsystem.
//!
//! - [`DomainName`] - case-insensitive user store domain identifier
//! - [`UserStoreConfig`] / [`RealmConfig`] - configuration records for one
//!   user store and for a realm's ordered set of stores
//! - [`UniqueIdDomainMapping`] - persisted "entity ID is owned by domain" row
//! - [`user`] - value types exchanged with user store managers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod domain;
pub mod error;
pub mod mapping;
pub mod user;

pub use config::{RealmConfig, UserStoreConfig};
pub use domain::DomainName;
pub use error::{ModelError, ModelResult};
pub use mapping::{EntityKind, UniqueIdDomainMapping};
pub use user::{Claims, Credential, QualifiedName, User};
