//! Audit events for user store topology and domain mapping changes.
//!
//! Events are plain values; [`Event::emit`] writes them to the `audit`
//! tracing target so operators can follow chain edits and mapping churn
//! without enabling debug logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::TenantId;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Chain topology events
    /// A user store was appended to a realm's chain.
    UserStoreAdded,
    /// A user store was removed from a realm's chain.
    UserStoreRemoved,
    /// A configured user store was not added to the chain.
    UserStoreSkipped,

    // Domain mapping events
    /// An entity's owning domain was recorded or changed.
    DomainMappingUpdated,
    /// An entity's domain mapping was deleted.
    DomainMappingRemoved,
    /// A mapping pointing at a domain that no longer exists was evicted.
    StaleDomainMappingEvicted,
}

impl EventType {
    /// Returns the wire name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserStoreAdded => "USER_STORE_ADDED",
            Self::UserStoreRemoved => "USER_STORE_REMOVED",
            Self::UserStoreSkipped => "USER_STORE_SKIPPED",
            Self::DomainMappingUpdated => "DOMAIN_MAPPING_UPDATED",
            Self::DomainMappingRemoved => "DOMAIN_MAPPING_REMOVED",
            Self::StaleDomainMappingEvicted => "STALE_DOMAIN_MAPPING_EVICTED",
        }
    }
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Tenant the event belongs to.
    pub tenant_id: Option<TenantId>,

    /// User store domain involved.
    pub domain: Option<String>,

    /// User or group unique ID involved.
    pub entity_id: Option<String>,

    /// Error message (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Writes the event to the `audit` tracing target.
    pub fn emit(&self) {
        match self.outcome {
            EventOutcome::Success => tracing::info!(
                target: "audit",
                event_id = %self.id,
                event_type = self.event_type.as_str(),
                tenant_id = ?self.tenant_id,
                domain = ?self.domain,
                entity_id = ?self.entity_id,
                details = ?self.details,
                "user store event"
            ),
            EventOutcome::Failure => tracing::warn!(
                target: "audit",
                event_id = %self.id,
                event_type = self.event_type.as_str(),
                tenant_id = ?self.tenant_id,
                domain = ?self.domain,
                entity_id = ?self.entity_id,
                error = ?self.error,
                details = ?self.details,
                "user store event failed"
            ),
        }
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    tenant_id: Option<TenantId>,
    domain: Option<String>,
    entity_id: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            tenant_id: None,
            domain: None,
            entity_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the tenant.
    #[must_use]
    pub const fn tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Sets the domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the entity unique ID.
    #[must_use]
    pub fn entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            tenant_id: self.tenant_id,
            domain: self.domain,
            entity_id: self.entity_id,
            error: self.error,
            details: self.details,
        }
    }
}
