//! Authorization manager capability.

use async_trait::async_trait;
use us_core::TenantId;

use crate::error::StorageResult;

/// Permission checks for one realm.
#[async_trait]
pub trait AuthorizationManager: Send + Sync {
    /// Returns whether any role of `username` allows `action` on `resource`.
    async fn is_user_authorized(
        &self,
        username: &str,
        roles: &[String],
        resource: &str,
        action: &str,
    ) -> StorageResult<bool>;

    /// Returns whether `role` allows `action` on `resource`.
    async fn is_role_authorized(&self, role: &str, resource: &str, action: &str)
        -> StorageResult<bool>;

    /// Grants `action` on `resource` to `role`.
    async fn authorize_role(&self, role: &str, resource: &str, action: &str) -> StorageResult<()>;

    /// Revokes `action` on `resource` from `role`.
    async fn deny_role(&self, role: &str, resource: &str, action: &str) -> StorageResult<()>;

    /// Drops every permission of `role`.
    async fn clear_role_authorization(&self, role: &str) -> StorageResult<()>;

    /// Tenant this manager serves.
    fn tenant_id(&self) -> TenantId;
}
