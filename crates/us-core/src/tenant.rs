//! Tenant identity and the ambient tenant context.
//!
//! Every cache and mapping-table call runs inside a tenant scope. The scope
//! is task-local, so it follows the future across `.await` points and is
//! always exited when the future completes, is dropped, or panics.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

/// Numeric tenant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i32);

impl TenantId {
    /// The super tenant, owner of the default realm.
    pub const SUPER: Self = Self(-1234);

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for TenantId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_TENANT: TenantId;
}

/// Scoped access to the tenant the current task is acting for.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantContext;

impl TenantContext {
    /// Runs `fut` with `tenant` as the current tenant.
    ///
    /// Scopes nest: the inner tenant wins until the inner future finishes,
    /// after which the outer tenant is visible again.
    pub async fn scope<F>(tenant: TenantId, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_TENANT.scope(tenant, fut).await
    }

    /// Runs a synchronous closure with `tenant` as the current tenant.
    pub fn sync_scope<R>(tenant: TenantId, f: impl FnOnce() -> R) -> R {
        CURRENT_TENANT.sync_scope(tenant, f)
    }

    /// Returns the current tenant, if the caller is inside a scope.
    #[must_use]
    pub fn current() -> Option<TenantId> {
        CURRENT_TENANT.try_with(|tenant| *tenant).ok()
    }
}
