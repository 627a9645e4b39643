//! End-to-end tests
//!
//! In-memory tests run everywhere. Tests against PostgreSQL start a
//! container through testcontainers and are ignored unless requested:
//!
//! ```bash
//! cargo test -p us-integration-tests -- --ignored
//! ```

mod common;
mod postgres_realm;
mod realm_lifecycle;
