use async_trait::async_trait;
use dashmap::DashSet;
use tracing::debug;
use us_core::TenantId;

use crate::authz::AuthorizationManager;
use crate::error::StorageResult;

/// Role permissions held as `(role, resource, action)` triples.
#[derive(Debug)]
pub struct InMemoryAuthorizationManager {
    tenant_id: TenantId,
    grants: DashSet<(String, String, String)>,
}

impl InMemoryAuthorizationManager {
    /// Creates a manager without grants.
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            grants: DashSet::new(),
        }
    }

    fn key(role: &str, resource: &str, action: &str) -> (String, String, String) {
        (role.to_string(), resource.to_string(), action.to_string())
    }
}

#[async_trait]
impl AuthorizationManager for InMemoryAuthorizationManager {
    async fn is_user_authorized(
        &self,
        username: &str,
        roles: &[String],
        resource: &str,
        action: &str,
    ) -> StorageResult<bool> {
        let allowed = roles
            .iter()
            .any(|role| self.grants.contains(&Self::key(role, resource, action)));
        debug!(username, resource, action, allowed, "authorization check");
        Ok(allowed)
    }

    async fn is_role_authorized(
        &self,
        role: &str,
        resource: &str,
        action: &str,
    ) -> StorageResult<bool> {
        Ok(self.grants.contains(&Self::key(role, resource, action)))
    }

    async fn authorize_role(&self, role: &str, resource: &str, action: &str) -> StorageResult<()> {
        self.grants.insert(Self::key(role, resource, action));
        Ok(())
    }

    async fn deny_role(&self, role: &str, resource: &str, action: &str) -> StorageResult<()> {
        self.grants.remove(&Self::key(role, resource, action));
        Ok(())
    }

    async fn clear_role_authorization(&self, role: &str) -> StorageResult<()> {
        self.grants.retain(|(r, _, _)| r != role);
        Ok(())
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
