//! Startup assembly of a realm's chain.
//!
//! The primary store must come up; secondaries are best effort. A secondary
//! that cannot be used is logged, recorded in [`AssembledRealm::skipped`]
//! and left out, and assembly carries on with the next one.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};
use us_core::event::{Event, EventType};
use us_core::TenantId;
use us_model::{DomainName, RealmConfig, UserStoreConfig};
use us_storage::AuthorizationManager;

use crate::chain::{ChainSnapshot, StoreEntry};
use crate::error::{RealmError, RealmResult};
use crate::factory::{StoreContext, StoreFactoryRegistry};

/// A secondary store left out of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStore {
    /// Domain of the store, if it declared one.
    pub domain: Option<DomainName>,
    /// Why it was left out.
    pub reason: String,
}

/// Result of assembling a realm.
pub struct AssembledRealm {
    /// Stores in configuration order with the derived manager chain.
    pub snapshot: ChainSnapshot,
    /// The realm's authorization manager.
    pub authorization_manager: Arc<dyn AuthorizationManager>,
    /// Secondaries that were not added.
    pub skipped: Vec<SkippedStore>,
}

impl std::fmt::Debug for AssembledRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledRealm")
            .field("snapshot", &self.snapshot)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

fn skip(
    tenant: TenantId,
    skipped: &mut Vec<SkippedStore>,
    domain: Option<&DomainName>,
    reason: impl Into<String>,
) {
    let reason = reason.into();
    let mut event = Event::builder(EventType::UserStoreSkipped)
        .tenant(tenant)
        .detail("reason", reason.clone());
    if let Some(domain) = domain {
        event = event.domain(domain.as_str());
    }
    event.build().emit();
    skipped.push(SkippedStore {
        domain: domain.cloned(),
        reason,
    });
}

async fn primary_entry(
    config: &UserStoreConfig,
    registry: &StoreFactoryRegistry,
    context: &StoreContext,
) -> RealmResult<StoreEntry> {
    let domain = config.effective_domain().unwrap_or_else(DomainName::primary);
    if config.disabled {
        warn!(
            tenant_id = %context.tenant_id,
            domain = %domain,
            "primary user store cannot be disabled, ignoring the flag"
        );
    }
    let mut config = config.clone();
    config.primary = true;
    config.disabled = false;
    let config = &config;

    let Some(store_type) = config.store_type.as_deref() else {
        info!(
            tenant_id = %context.tenant_id,
            domain = %domain,
            "primary user store has no store type, functioning without user store writing ability"
        );
        return Ok(StoreEntry::config_only(domain, config.clone()));
    };

    match registry.create_store(store_type, config, context).await? {
        Ok(manager) => Ok(StoreEntry::active(domain, config.clone(), manager)),
        Err(source) => {
            error!(
                tenant_id = %context.tenant_id,
                domain = %domain,
                store_type,
                error = %source,
                "cannot create primary user store"
            );
            Err(RealmError::PrimaryStoreUnavailable {
                domain: domain.to_string(),
                source,
            })
        }
    }
}

/// Builds the chain and authorization manager of a realm.
///
/// ## Errors
///
/// - `UnknownStoreType` if the primary names an unregistered store type
/// - `PrimaryStoreUnavailable` if the primary store (or a secondary marked
///   primary) cannot be created
/// - `MissingAuthorizationManager` if the configuration names none
/// - `AuthorizationManagerUnavailable` if it cannot be created
pub async fn assemble(
    config: &RealmConfig,
    registry: &StoreFactoryRegistry,
) -> RealmResult<AssembledRealm> {
    let context = StoreContext::from(config);
    let tenant = context.tenant_id;

    let primary = primary_entry(&config.primary, registry, &context).await?;
    let mut seen = HashSet::from([primary.domain().clone()]);
    let mut entries = vec![Arc::new(primary)];
    let mut skipped = Vec::new();

    for secondary in &config.secondaries {
        let Some(domain) = secondary.domain_name.clone() else {
            warn!(tenant_id = %tenant, "secondary user store has no domain name, skipping");
            skip(tenant, &mut skipped, None, "no domain name");
            continue;
        };
        if seen.contains(&domain) {
            warn!(
                tenant_id = %tenant,
                domain = %domain,
                "user store domain is already in the chain, skipping"
            );
            skip(tenant, &mut skipped, Some(&domain), "duplicate domain");
            continue;
        }
        if secondary.disabled {
            warn!(
                tenant_id = %tenant,
                domain = %domain,
                "secondary user store is disabled"
            );
            seen.insert(domain.clone());
            entries.push(Arc::new(StoreEntry::config_only(domain, secondary.clone())));
            continue;
        }
        let Some(store_type) = secondary.store_type.as_deref() else {
            info!(
                tenant_id = %tenant,
                domain = %domain,
                "secondary user store has no store type, skipping"
            );
            skip(tenant, &mut skipped, Some(&domain), "no store type");
            continue;
        };

        let created = match registry.create_store(store_type, secondary, &context).await {
            Ok(created) => created,
            Err(e) if secondary.primary => return Err(e),
            Err(e) => {
                warn!(tenant_id = %tenant, domain = %domain, error = %e, "skipping secondary user store");
                skip(tenant, &mut skipped, Some(&domain), e.to_string());
                continue;
            }
        };
        match created {
            Ok(manager) => {
                info!(
                    tenant_id = %tenant,
                    domain = %domain,
                    store_type,
                    "secondary user store added"
                );
                seen.insert(domain.clone());
                entries.push(Arc::new(StoreEntry::active(domain, secondary.clone(), manager)));
            }
            Err(source) if secondary.primary => {
                error!(
                    tenant_id = %tenant,
                    domain = %domain,
                    error = %source,
                    "cannot create user store marked primary"
                );
                return Err(RealmError::PrimaryStoreUnavailable {
                    domain: domain.to_string(),
                    source,
                });
            }
            Err(source) => {
                let err = RealmError::SecondaryStoreUnavailable {
                    domain: domain.clone(),
                    reason: source.to_string(),
                };
                warn!(tenant_id = %tenant, error = %err, "skipping secondary user store");
                skip(tenant, &mut skipped, Some(&domain), err.to_string());
            }
        }
    }

    let Some(authz_id) = config.authorization_manager.as_deref() else {
        error!(tenant_id = %tenant, "realm configuration names no authorization manager");
        return Err(RealmError::MissingAuthorizationManager);
    };
    let authorization_manager = registry
        .create_authorization(authz_id, &context)
        .await
        .inspect_err(|e| {
            error!(tenant_id = %tenant, error = %e, "cannot create authorization manager");
        })?;

    let snapshot = ChainSnapshot::from_entries(entries);
    info!(
        tenant_id = %tenant,
        chain_len = snapshot.len(),
        skipped = skipped.len(),
        "realm chain assembled"
    );
    Ok(AssembledRealm {
        snapshot,
        authorization_manager,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FnStoreFactory;
    use us_storage::{StorageError, UserStoreManager};

    fn store(domain: &str) -> UserStoreConfig {
        UserStoreConfig::builder()
            .domain(DomainName::new(domain).unwrap())
            .store_type("memory")
            .build()
    }

    fn realm(secondaries: &[UserStoreConfig]) -> RealmConfig {
        let mut config = RealmConfig::new(
            TenantId(1),
            UserStoreConfig::builder().store_type("memory").build(),
        )
        .with_authorization_manager("memory");
        config.secondaries = secondaries.to_vec();
        config
    }

    fn registry() -> StoreFactoryRegistry {
        let registry = StoreFactoryRegistry::with_in_memory();
        registry.register_store(FnStoreFactory::new("broken", |_, _| {
            Err(StorageError::Connection("directory unreachable".to_string()))
        }));
        registry
    }

    fn names(snapshot: &ChainSnapshot) -> Vec<String> {
        snapshot.domains().iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn chain_follows_configuration_order() {
        let assembled = assemble(&realm(&[store("ldap"), store("jdbc")]), &registry())
            .await
            .unwrap();

        assert_eq!(names(&assembled.snapshot), ["PRIMARY", "LDAP", "JDBC"]);
        assert!(assembled.skipped.is_empty());
        for name in ["PRIMARY", "LDAP", "JDBC"] {
            let domain = DomainName::new(name).unwrap();
            let node = assembled.snapshot.node(&domain).unwrap();
            assert_eq!(node.domain(), &domain);
            assert_eq!(node.realm_config().effective_domain(), Some(domain));
        }
    }

    #[tokio::test]
    async fn duplicate_domain_is_skipped() {
        let assembled = assemble(&realm(&[store("ldap"), store("LDAP")]), &registry())
            .await
            .unwrap();

        assert_eq!(assembled.snapshot.len(), 2);
        assert_eq!(names(&assembled.snapshot), ["PRIMARY", "LDAP"]);
        assert_eq!(assembled.skipped.len(), 1);
        assert_eq!(assembled.skipped[0].reason, "duplicate domain");
    }

    #[tokio::test]
    async fn failing_primary_aborts_assembly() {
        let mut config = realm(&[store("ldap")]);
        config.primary.store_type = Some("broken".to_string());

        let err = assemble(&config, &registry()).await.unwrap_err();
        assert!(matches!(err, RealmError::PrimaryStoreUnavailable { ref domain, .. } if domain == "PRIMARY"));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn unknown_primary_type_fails_fast() {
        let mut config = realm(&[]);
        config.primary.store_type = Some("ldap".to_string());

        let err = assemble(&config, &registry()).await.unwrap_err();
        assert!(matches!(err, RealmError::UnknownStoreType(ref t) if t == "ldap"));
    }

    #[tokio::test]
    async fn failing_secondary_is_skipped() {
        let broken = UserStoreConfig::builder()
            .domain(DomainName::new("AD").unwrap())
            .store_type("broken")
            .build();
        let unknown = UserStoreConfig::builder()
            .domain(DomainName::new("LDAP").unwrap())
            .store_type("ldap")
            .build();

        let assembled = assemble(&realm(&[broken, unknown, store("jdbc")]), &registry())
            .await
            .unwrap();

        assert_eq!(names(&assembled.snapshot), ["PRIMARY", "JDBC"]);
        let skipped: Vec<_> = assembled
            .skipped
            .iter()
            .filter_map(|s| s.domain.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(skipped, ["AD", "LDAP"]);
    }

    #[tokio::test]
    async fn failing_store_marked_primary_aborts_assembly() {
        let broken = UserStoreConfig::builder()
            .domain(DomainName::new("AD").unwrap())
            .store_type("broken")
            .primary(true)
            .build();

        let err = assemble(&realm(&[broken]), &registry()).await.unwrap_err();
        assert!(matches!(err, RealmError::PrimaryStoreUnavailable { ref domain, .. } if domain == "AD"));
    }

    #[tokio::test]
    async fn missing_authorization_manager_is_fatal() {
        let mut config = realm(&[]);
        config.authorization_manager = None;

        let err = assemble(&config, &registry()).await.unwrap_err();
        assert!(matches!(err, RealmError::MissingAuthorizationManager));
    }

    #[tokio::test]
    async fn primary_without_store_type_runs_degraded() {
        let mut config = realm(&[store("ldap")]);
        config.primary.store_type = None;

        let assembled = assemble(&config, &registry()).await.unwrap();
        assert_eq!(names(&assembled.snapshot), ["LDAP"]);
        assert_eq!(
            assembled.snapshot.config_domains(),
            vec![DomainName::primary(), DomainName::new("LDAP").unwrap()]
        );
        assert!(assembled.snapshot.primary().unwrap().manager().is_none());
    }

    #[tokio::test]
    async fn disabled_secondary_is_kept_out_of_the_chain() {
        let disabled = UserStoreConfig::builder()
            .domain(DomainName::new("OLD").unwrap())
            .store_type("memory")
            .disabled(true)
            .build();

        let assembled = assemble(&realm(&[disabled, store("ldap")]), &registry())
            .await
            .unwrap();

        assert_eq!(names(&assembled.snapshot), ["PRIMARY", "LDAP"]);
        assert!(assembled.snapshot.contains_domain(&DomainName::new("old").unwrap()));
        assert!(assembled.skipped.is_empty());
    }

    #[tokio::test]
    async fn secondary_without_domain_is_skipped() {
        let anonymous = UserStoreConfig::builder().store_type("memory").build();

        let assembled = assemble(&realm(&[anonymous]), &registry()).await.unwrap();
        assert_eq!(assembled.snapshot.len(), 1);
        assert_eq!(assembled.skipped[0].domain, None);
    }

    #[tokio::test]
    async fn secondary_without_store_type_is_skipped() {
        let untyped = UserStoreConfig::builder()
            .domain(DomainName::new("ldap").unwrap())
            .build();

        let assembled = assemble(&realm(&[untyped, store("jdbc")]), &registry())
            .await
            .unwrap();
        assert_eq!(names(&assembled.snapshot), ["PRIMARY", "JDBC"]);
        assert_eq!(assembled.skipped.len(), 1);
        assert_eq!(assembled.skipped[0].domain, Some(DomainName::new("LDAP").unwrap()));
        assert_eq!(assembled.skipped[0].reason, "no store type");
        assert!(!assembled.snapshot.contains_domain(&DomainName::new("LDAP").unwrap()));
    }

    #[tokio::test]
    async fn disabled_flag_on_primary_is_ignored() {
        let mut config = realm(&[store("ldap")]);
        config.primary = UserStoreConfig::builder()
            .store_type("memory")
            .disabled(true)
            .build();

        let assembled = assemble(&config, &registry()).await.unwrap();
        assert_eq!(names(&assembled.snapshot), ["PRIMARY", "LDAP"]);
        let primary = assembled.snapshot.primary().unwrap();
        assert!(primary.is_enabled());
        assert!(primary.config().primary);
        assert!(!primary.config().disabled);
        assert_eq!(
            assembled.snapshot.head().unwrap().domain(),
            &DomainName::primary()
        );
    }
}
