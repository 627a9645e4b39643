//! Hooks invoked after the chain of a realm changes.

use async_trait::async_trait;
use us_core::TenantId;
use us_model::DomainName;

/// Receives chain mutations of a realm.
///
/// Hooks run after the new chain is visible to readers and before the next
/// mutation of the same realm starts, so they arrive in chain order. They
/// cannot veto the change and must not mutate the realm that calls them.
#[async_trait]
pub trait ChainListener: Send + Sync {
    /// A secondary store was added, enabled or not.
    async fn on_store_added(&self, _tenant: TenantId, _domain: &DomainName) {}

    /// A secondary store was removed.
    async fn on_store_removed(&self, _tenant: TenantId, _domain: &DomainName) {}
}
