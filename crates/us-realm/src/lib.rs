//! # us-realm
//!
//! The secondary user store chain of a realm.
//!
//! A realm owns an ordered chain of user store managers headed by the
//! primary store. This crate builds that chain from a
//! [`us_model::RealmConfig`], routes lookups through it, and edits it at
//! runtime when per-domain configuration files are deployed or removed.
//!
//! - [`chain`] - [`StoreEntry`], [`ChainNode`] and immutable [`ChainSnapshot`]s
//! - [`factory`] - the registry mapping store types to factories
//! - [`assembler`] - startup chain assembly
//! - [`realm`] - [`DefaultRealm`]: lookups, authentication, add/remove
//! - [`deployment`] - hot deploy of `*.toml` store files
//! - [`listener`] - hooks fired after chain edits
//!
//! Readers clone an `Arc<ChainSnapshot>` and traverse it without locks;
//! edits are serialised per realm and publish a new snapshot.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod assembler;
pub mod chain;
pub mod deployment;
pub mod error;
pub mod factory;
pub mod listener;
pub mod realm;

pub use assembler::{assemble, AssembledRealm, SkippedStore};
pub use chain::{ChainLink, ChainNode, ChainSnapshot, StoreEntry};
pub use deployment::{DeploymentReport, UserStoreDeploymentManager};
pub use error::{RealmError, RealmResult};
pub use factory::{
    AuthorizationManagerFactory, FnStoreFactory, InMemoryAuthorizationFactory,
    InMemoryStoreFactory, StoreContext, StoreFactoryRegistry, UserStoreFactory,
};
pub use listener::ChainListener;
pub use realm::{AddOutcome, DefaultRealm, DefaultRealmBuilder};
