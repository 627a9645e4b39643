//! # us-core
//!
//! Core utilities, configuration, and error handling for the user-store
//! subsystem.
//!
//! This crate provides foundational types used by every other crate in the
//! workspace:
//!
//! - [`Config`] - cache, database and deployment settings
//! - [`Error`] - top-level error for configuration and wiring
//! - [`event`] - structured audit events for chain and mapping changes
//! - [`tenant`] - the ambient tenant context that scopes cache and DB calls

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod tenant;

pub use config::Config;
pub use error::{Error, Result};
pub use tenant::{TenantContext, TenantId};
