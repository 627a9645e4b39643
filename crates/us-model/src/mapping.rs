//! Persisted "entity is owned by domain" mappings.

use std::fmt;

use serde::{Deserialize, Serialize};
use us_core::TenantId;

use crate::domain::DomainName;

/// Kind of entity a mapping refers to.
///
/// Users and groups are mapped independently: each kind has its own cache
/// and its own table, so a user and a group may share an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// User unique IDs.
    User,
    /// Group unique IDs.
    Group,
}

impl EntityKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a domain mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueIdDomainMapping {
    /// Entity kind, selecting the table.
    pub kind: EntityKind,
    /// User or group unique ID.
    pub entity_id: String,
    /// Tenant the entity belongs to.
    pub tenant_id: TenantId,
    /// Domain currently owning the entity.
    pub domain_name: DomainName,
}

impl UniqueIdDomainMapping {
    /// Creates a mapping row.
    #[must_use]
    pub fn new(
        kind: EntityKind,
        entity_id: impl Into<String>,
        tenant_id: TenantId,
        domain_name: DomainName,
    ) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            tenant_id,
            domain_name,
        }
    }

    /// Returns the `(entity_id, tenant_id)` key the row is unique on.
    #[must_use]
    pub fn key(&self) -> (&str, TenantId) {
        (&self.entity_id, self.tenant_id)
    }
}
