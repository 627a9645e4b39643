//! Idempotent creation of the domain mapping tables.

use sqlx::PgPool;
use tracing::debug;
use us_storage::{StorageError, StorageResult};

const STATEMENTS: &[(&str, &str)] = &[
    (
        "um_domain",
        r"
        CREATE TABLE IF NOT EXISTS um_domain (
            um_domain_id SERIAL,
            um_domain_name VARCHAR(255) NOT NULL,
            um_tenant_id INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (um_domain_id),
            UNIQUE (um_domain_name, um_tenant_id)
        )
        ",
    ),
    (
        "um_uuid_domain_mapper",
        r"
        CREATE TABLE IF NOT EXISTS um_uuid_domain_mapper (
            um_id SERIAL PRIMARY KEY,
            um_user_id VARCHAR(255) NOT NULL,
            um_domain_id INTEGER NOT NULL,
            um_tenant_id INTEGER NOT NULL DEFAULT 0,
            UNIQUE (um_user_id, um_tenant_id),
            FOREIGN KEY (um_domain_id) REFERENCES um_domain (um_domain_id) ON DELETE CASCADE
        )
        ",
    ),
    (
        "um_group_uuid_domain_mapper",
        r"
        CREATE TABLE IF NOT EXISTS um_group_uuid_domain_mapper (
            um_id SERIAL PRIMARY KEY,
            um_group_id VARCHAR(255) NOT NULL,
            um_domain_id INTEGER NOT NULL,
            um_tenant_id INTEGER NOT NULL DEFAULT 0,
            UNIQUE (um_group_id, um_tenant_id),
            FOREIGN KEY (um_domain_id) REFERENCES um_domain (um_domain_id) ON DELETE CASCADE
        )
        ",
    ),
];

/// Creates the domain and mapping tables if they do not exist.
///
/// # Errors
///
/// Returns `StorageError::Query` naming the table that could not be created.
pub async fn run_migrations(pool: &PgPool) -> StorageResult<()> {
    debug!("Running domain mapping migrations");
    for (table, statement) in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Query(format!("Failed to create {table} table: {e}")))?;
    }
    Ok(())
}
