//! Persisted domain mapping store.

use async_trait::async_trait;
use us_core::TenantId;
use us_model::{DomainName, EntityKind};

use crate::error::StorageResult;

/// The `(entity unique ID, tenant) -> domain` table of one entity kind.
///
/// Implementations hold at most one row per `(entity_id, tenant)`.
#[async_trait]
pub trait DomainMappingStore: Send + Sync {
    /// Entity kind this store maps.
    fn kind(&self) -> EntityKind;

    /// Reads the domain owning an entity.
    async fn get(&self, entity_id: &str, tenant: TenantId) -> StorageResult<Option<DomainName>>;

    /// Inserts or updates the mapping atomically.
    ///
    /// Concurrent callers for the same entity never produce two rows.
    ///
    /// ## Errors
    ///
    /// Returns a database error; the write is rolled back before returning.
    async fn upsert(
        &self,
        entity_id: &str,
        tenant: TenantId,
        domain: &DomainName,
    ) -> StorageResult<()>;

    /// Deletes the mapping if it points at `domain`.
    ///
    /// Returns whether a row was deleted.
    async fn delete(
        &self,
        entity_id: &str,
        tenant: TenantId,
        domain: &DomainName,
    ) -> StorageResult<bool>;

    /// Deletes the mapping whatever domain it points at.
    async fn delete_any(&self, entity_id: &str, tenant: TenantId) -> StorageResult<bool>;

    /// Counts rows for an entity (0 or 1 while the uniqueness holds).
    async fn row_count(&self, entity_id: &str, tenant: TenantId) -> StorageResult<u64>;
}
