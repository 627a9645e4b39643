//! `PostgreSQL` implementation of the domain mapping store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};
use us_core::TenantId;
use us_model::{DomainName, EntityKind};
use us_storage::{DomainMappingStore, StorageError, StorageResult};

use crate::error::{from_sqlx_error, from_transaction_error};

/// Table and key column holding the mappings of one entity kind.
const fn table_for(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::User => ("um_uuid_domain_mapper", "um_user_id"),
        EntityKind::Group => ("um_group_uuid_domain_mapper", "um_group_id"),
    }
}

/// `PostgreSQL` domain mapping store for one entity kind.
#[derive(Debug, Clone)]
pub struct PgDomainMappingStore {
    pool: PgPool,
    kind: EntityKind,
    table: &'static str,
    column: &'static str,
}

impl PgDomainMappingStore {
    /// Creates a store over the table of `kind`.
    #[must_use]
    pub const fn new(pool: PgPool, kind: EntityKind) -> Self {
        let (table, column) = table_for(kind);
        Self {
            pool,
            kind,
            table,
            column,
        }
    }

    /// Creates the user mapping store.
    #[must_use]
    pub const fn for_users(pool: PgPool) -> Self {
        Self::new(pool, EntityKind::User)
    }

    /// Creates the group mapping store.
    #[must_use]
    pub const fn for_groups(pool: PgPool) -> Self {
        Self::new(pool, EntityKind::Group)
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn upsert_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entity_id: &str,
        tenant: TenantId,
        domain: &DomainName,
    ) -> StorageResult<()> {
        sqlx::query(
            r"INSERT INTO um_domain (um_domain_name, um_tenant_id) VALUES ($1, $2)
            ON CONFLICT (um_domain_name, um_tenant_id) DO NOTHING",
        )
        .bind(domain.as_str())
        .bind(tenant.get())
        .execute(&mut **tx)
        .await
        .map_err(from_sqlx_error)?;

        let sql = format!(
            r"INSERT INTO {table} ({column}, um_domain_id, um_tenant_id)
            SELECT $1, um_domain_id, $3 FROM um_domain
            WHERE um_domain_name = $2 AND um_tenant_id = $3
            ON CONFLICT ({column}, um_tenant_id)
            DO UPDATE SET um_domain_id = EXCLUDED.um_domain_id",
            table = self.table,
            column = self.column,
        );
        let result = sqlx::query(&sql)
            .bind(entity_id)
            .bind(domain.as_str())
            .bind(tenant.get())
            .execute(&mut **tx)
            .await
            .map_err(from_sqlx_error)?;

        if result.rows_affected() != 1 {
            return Err(StorageError::Query(format!(
                "upsert into {} affected {} rows",
                self.table,
                result.rows_affected()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DomainMappingStore for PgDomainMappingStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn get(&self, entity_id: &str, tenant: TenantId) -> StorageResult<Option<DomainName>> {
        let sql = format!(
            r"SELECT d.um_domain_name FROM {table} m
            JOIN um_domain d ON m.um_domain_id = d.um_domain_id
            WHERE m.{column} = $1 AND m.um_tenant_id = $2",
            table = self.table,
            column = self.column,
        );
        let name: Option<String> = sqlx::query_scalar(&sql)
            .bind(entity_id)
            .bind(tenant.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        Ok(name.map(DomainName::new).transpose()?)
    }

    async fn upsert(
        &self,
        entity_id: &str,
        tenant: TenantId,
        domain: &DomainName,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(from_transaction_error)?;

        match self.upsert_in(&mut tx, entity_id, tenant, domain).await {
            Ok(()) => {
                tx.commit().await.map_err(from_transaction_error)?;
                debug!(
                    table = self.table,
                    entity_id,
                    tenant_id = %tenant,
                    domain = %domain,
                    "domain mapping persisted"
                );
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(
                        table = self.table,
                        entity_id,
                        tenant_id = %tenant,
                        error = %rollback,
                        "rollback of domain mapping upsert failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn delete(
        &self,
        entity_id: &str,
        tenant: TenantId,
        domain: &DomainName,
    ) -> StorageResult<bool> {
        let sql = format!(
            r"DELETE FROM {table} m USING um_domain d
            WHERE m.um_domain_id = d.um_domain_id
            AND m.{column} = $1 AND m.um_tenant_id = $2 AND d.um_domain_name = $3",
            table = self.table,
            column = self.column,
        );
        let result = sqlx::query(&sql)
            .bind(entity_id)
            .bind(tenant.get())
            .bind(domain.as_str())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_any(&self, entity_id: &str, tenant: TenantId) -> StorageResult<bool> {
        let sql = format!(
            "DELETE FROM {table} WHERE {column} = $1 AND um_tenant_id = $2",
            table = self.table,
            column = self.column,
        );
        let result = sqlx::query(&sql)
            .bind(entity_id)
            .bind(tenant.get())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn row_count(&self, entity_id: &str, tenant: TenantId) -> StorageResult<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {column} = $1 AND um_tenant_id = $2",
            table = self.table,
            column = self.column,
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(entity_id)
            .bind(tenant.get())
            .fetch_one(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
