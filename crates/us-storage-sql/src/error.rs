//! SQL storage error types.

use sqlx::Error as SqlxError;
use us_storage::StorageError;

/// Converts a `SQLx` error to a storage error.
#[allow(clippy::needless_pass_by_value)]
pub fn from_sqlx_error(err: SqlxError) -> StorageError {
    match err {
        SqlxError::RowNotFound => StorageError::Internal("Row not found".to_string()),
        SqlxError::Database(db_err) => {
            // PostgreSQL unique violation
            if db_err.code().is_some_and(|c| c == "23505") {
                StorageError::duplicate("DomainMapping", "entity_id", db_err.message())
            } else if db_err.code().is_some_and(|c| c == "23503") {
                StorageError::Query(format!("Reference violation: {}", db_err.message()))
            } else {
                StorageError::Query(db_err.to_string())
            }
        }
        SqlxError::PoolTimedOut => StorageError::Connection("Connection pool timeout".to_string()),
        SqlxError::PoolClosed => StorageError::Connection("Connection pool closed".to_string()),
        SqlxError::Io(e) => StorageError::Connection(e.to_string()),
        _ => StorageError::Internal(err.to_string()),
    }
}

/// Converts a `SQLx` error raised by `BEGIN`, `COMMIT` or `ROLLBACK`.
#[allow(clippy::needless_pass_by_value)]
pub fn from_transaction_error(err: SqlxError) -> StorageError {
    match from_sqlx_error(err) {
        StorageError::Query(msg) | StorageError::Internal(msg) => StorageError::Transaction(msg),
        other => other,
    }
}
