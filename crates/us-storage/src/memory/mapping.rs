use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use us_core::TenantId;
use us_model::{DomainName, EntityKind};

use crate::error::{StorageError, StorageResult};
use crate::mapping::DomainMappingStore;

/// Domain mapping table held in a `DashMap`.
///
/// Upserts go through the map's entry lock, so concurrent first writes for
/// one entity leave exactly one row.
#[derive(Debug)]
pub struct InMemoryDomainMappingStore {
    kind: EntityKind,
    rows: DashMap<(String, TenantId), DomainName>,
    reads: AtomicU64,
    fail_writes: AtomicBool,
}

impl InMemoryDomainMappingStore {
    /// Creates an empty table for `kind`.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            rows: DashMap::new(),
            reads: AtomicU64::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Number of `get` calls served so far.
    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Total rows across all tenants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Makes every write fail with a transaction error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Transaction(
                "mapping table rejected the write".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DomainMappingStore for InMemoryDomainMappingStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn get(&self, entity_id: &str, tenant: TenantId) -> StorageResult<Option<DomainName>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .get(&(entity_id.to_string(), tenant))
            .map(|row| row.value().clone()))
    }

    async fn upsert(
        &self,
        entity_id: &str,
        tenant: TenantId,
        domain: &DomainName,
    ) -> StorageResult<()> {
        self.check_writable()?;
        self.rows
            .entry((entity_id.to_string(), tenant))
            .and_modify(|existing| *existing = domain.clone())
            .or_insert_with(|| domain.clone());
        Ok(())
    }

    async fn delete(
        &self,
        entity_id: &str,
        tenant: TenantId,
        domain: &DomainName,
    ) -> StorageResult<bool> {
        self.check_writable()?;
        Ok(self
            .rows
            .remove_if(&(entity_id.to_string(), tenant), |_, stored| stored == domain)
            .is_some())
    }

    async fn delete_any(&self, entity_id: &str, tenant: TenantId) -> StorageResult<bool> {
        self.check_writable()?;
        Ok(self.rows.remove(&(entity_id.to_string(), tenant)).is_some())
    }

    async fn row_count(&self, entity_id: &str, tenant: TenantId) -> StorageResult<u64> {
        Ok(u64::from(self.rows.contains_key(&(entity_id.to_string(), tenant))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(name: &str) -> DomainName {
        DomainName::new(name).unwrap()
    }

    #[tokio::test]
    async fn upsert_updates_in_place() {
        let store = InMemoryDomainMappingStore::new(EntityKind::User);
        store.upsert("u-1", TenantId(1), &domain("LDAP")).await.unwrap();
        store.upsert("u-1", TenantId(1), &domain("JDBC")).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.row_count("u-1", TenantId(1)).await.unwrap(), 1);
        assert_eq!(store.get("u-1", TenantId(1)).await.unwrap(), Some(domain("JDBC")));
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn delete_only_matching_domain() {
        let store = InMemoryDomainMappingStore::new(EntityKind::Group);
        store.upsert("g-1", TenantId(1), &domain("LDAP")).await.unwrap();

        assert!(!store.delete("g-1", TenantId(1), &domain("JDBC")).await.unwrap());
        assert!(store.delete("g-1", TenantId(1), &domain("LDAP")).await.unwrap());
        assert!(!store.delete_any("g-1", TenantId(1)).await.unwrap());
    }

    #[tokio::test]
    async fn failing_writes_leave_table_untouched() {
        let store = InMemoryDomainMappingStore::new(EntityKind::User);
        store.set_fail_writes(true);
        let err = store.upsert("u-1", TenantId(1), &domain("LDAP")).await.unwrap_err();
        assert!(err.is_database_error());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn rows_are_scoped_by_tenant() {
        let store = InMemoryDomainMappingStore::new(EntityKind::User);
        store.upsert("u-1", TenantId(1), &domain("LDAP")).await.unwrap();
        assert_eq!(store.get("u-1", TenantId(2)).await.unwrap(), None);
    }
}
