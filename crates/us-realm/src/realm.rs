//! The default realm: lookups over the chain and runtime chain edits.
//!
//! The chain lives in an `Arc<ChainSnapshot>` behind a short-lived
//! `parking_lot` lock. Readers clone the `Arc` and traverse without
//! holding any lock. Edits are serialised by an async mutex, build a new
//! snapshot from the current one and swap it in. Audit events and
//! listeners fire before the edit lock is released.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};
use us_core::event::{Event, EventType};
use us_core::TenantId;
use us_model::{Credential, DomainName, EntityKind, QualifiedName, RealmConfig, UserStoreConfig};
use us_resolver::{ResolverError, UniqueIdDomainResolver};
use us_storage::{AuthorizationManager, UserStoreManager};

use crate::assembler::{assemble, SkippedStore};
use crate::chain::{ChainNode, ChainSnapshot, StoreEntry};
use crate::error::{RealmError, RealmResult};
use crate::factory::{StoreContext, StoreFactoryRegistry};
use crate::listener::ChainListener;

/// Outcome of [`DefaultRealm::add_secondary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The store was appended to the manager chain.
    Added,
    /// The store is disabled; only its configuration was recorded.
    AddedDisabled,
    /// A store with the same domain is already configured. Nothing changed.
    Duplicate,
}

impl AddOutcome {
    /// Whether the chain changed.
    #[must_use]
    pub const fn is_added(self) -> bool {
        matches!(self, Self::Added | Self::AddedDisabled)
    }
}

/// Builder for [`DefaultRealm`].
pub struct DefaultRealmBuilder {
    config: RealmConfig,
    registry: Arc<StoreFactoryRegistry>,
    user_resolver: Option<UniqueIdDomainResolver>,
    group_resolver: Option<UniqueIdDomainResolver>,
    listeners: Vec<Arc<dyn ChainListener>>,
}

impl std::fmt::Debug for DefaultRealmBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultRealmBuilder")
            .field("tenant_id", &self.config.tenant_id)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl DefaultRealmBuilder {
    /// Sets the resolver recording which domain owns a user ID.
    #[must_use]
    pub fn user_resolver(mut self, resolver: UniqueIdDomainResolver) -> Self {
        self.user_resolver = Some(resolver);
        self
    }

    /// Sets the resolver recording which domain owns a group ID.
    #[must_use]
    pub fn group_resolver(mut self, resolver: UniqueIdDomainResolver) -> Self {
        self.group_resolver = Some(resolver);
        self
    }

    /// Registers a chain listener.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn ChainListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Assembles the chain and builds the realm.
    ///
    /// ## Errors
    ///
    /// Returns the assembly error if the primary store or the authorization
    /// manager cannot be created.
    pub async fn build(self) -> RealmResult<DefaultRealm> {
        let assembled = assemble(&self.config, &self.registry).await?;
        Ok(DefaultRealm {
            tenant_id: self.config.tenant_id,
            context: StoreContext::from(&self.config),
            registry: self.registry,
            chain: RwLock::new(Arc::new(assembled.snapshot)),
            mutation: tokio::sync::Mutex::new(()),
            authorization_manager: assembled.authorization_manager,
            skipped: assembled.skipped,
            user_resolver: self.user_resolver,
            group_resolver: self.group_resolver,
            listeners: RwLock::new(self.listeners),
        })
    }
}

/// A tenant's chain of user stores and its authorization manager.
pub struct DefaultRealm {
    tenant_id: TenantId,
    context: StoreContext,
    registry: Arc<StoreFactoryRegistry>,
    chain: RwLock<Arc<ChainSnapshot>>,
    mutation: tokio::sync::Mutex<()>,
    authorization_manager: Arc<dyn AuthorizationManager>,
    skipped: Vec<SkippedStore>,
    user_resolver: Option<UniqueIdDomainResolver>,
    group_resolver: Option<UniqueIdDomainResolver>,
    listeners: RwLock<Vec<Arc<dyn ChainListener>>>,
}

impl std::fmt::Debug for DefaultRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultRealm")
            .field("tenant_id", &self.tenant_id)
            .field("domains", &self.domains())
            .finish_non_exhaustive()
    }
}

impl DefaultRealm {
    /// Starts building a realm from `config`.
    #[must_use]
    pub fn builder(
        config: RealmConfig,
        registry: Arc<StoreFactoryRegistry>,
    ) -> DefaultRealmBuilder {
        DefaultRealmBuilder {
            config,
            registry,
            user_resolver: None,
            group_resolver: None,
            listeners: Vec::new(),
        }
    }

    /// Tenant owning the realm.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// The current chain.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ChainSnapshot> {
        Arc::clone(&*self.chain.read())
    }

    /// Head of the manager chain.
    #[must_use]
    pub fn user_store_manager(&self) -> Option<Arc<ChainNode>> {
        self.snapshot().head().cloned()
    }

    /// Enabled store serving `domain`.
    #[must_use]
    pub fn user_store_for_domain(&self, domain: &DomainName) -> Option<Arc<ChainNode>> {
        self.snapshot().node(domain).cloned()
    }

    /// The realm's authorization manager.
    #[must_use]
    pub fn authorization_manager(&self) -> &Arc<dyn AuthorizationManager> {
        &self.authorization_manager
    }

    /// Secondaries left out when the realm was assembled.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedStore] {
        &self.skipped
    }

    /// Domains of the manager chain, head first.
    #[must_use]
    pub fn domains(&self) -> Vec<DomainName> {
        self.snapshot().domains()
    }

    /// Domains of every configured store, disabled ones included.
    #[must_use]
    pub fn config_domains(&self) -> Vec<DomainName> {
        self.snapshot().config_domains()
    }

    /// Number of stores in the manager chain.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.snapshot().len()
    }

    /// Registers a chain listener.
    pub fn add_listener(&self, listener: Arc<dyn ChainListener>) {
        self.listeners.write().push(listener);
    }

    fn publish(&self, snapshot: ChainSnapshot) {
        *self.chain.write() = Arc::new(snapshot);
    }

    fn listeners(&self) -> Vec<Arc<dyn ChainListener>> {
        self.listeners.read().clone()
    }

    /// Appends a secondary store to the tail of the chain.
    ///
    /// ## Errors
    ///
    /// - `MissingDomainName` if the configuration has no domain
    /// - `UnknownStoreType` if its store type is not registered
    /// - `SecondaryStoreUnavailable` if the store cannot be created
    pub async fn add_secondary(&self, config: UserStoreConfig) -> RealmResult<AddOutcome> {
        let Some(domain) = config.domain_name.clone() else {
            error!(tenant_id = %self.tenant_id, "cannot add a user store without a domain name");
            return Err(RealmError::MissingDomainName);
        };

        let guard = self.mutation.lock().await;
        let current = self.snapshot();
        if current.contains_domain(&domain) {
            warn!(
                tenant_id = %self.tenant_id,
                domain = %domain,
                "user store domain is already in the chain"
            );
            return Ok(AddOutcome::Duplicate);
        }

        let (entry, outcome) = if config.disabled {
            warn!(
                tenant_id = %self.tenant_id,
                domain = %domain,
                "adding disabled user store, it will not serve requests"
            );
            (StoreEntry::config_only(domain.clone(), config), AddOutcome::AddedDisabled)
        } else {
            let Some(store_type) = config.store_type.clone() else {
                return Err(RealmError::SecondaryStoreUnavailable {
                    domain,
                    reason: "no store type configured".to_string(),
                });
            };
            let manager = self
                .registry
                .create_store(&store_type, &config, &self.context)
                .await?
                .map_err(|e| RealmError::SecondaryStoreUnavailable {
                    domain: domain.clone(),
                    reason: e.to_string(),
                })?;
            (StoreEntry::active(domain.clone(), config, manager), AddOutcome::Added)
        };

        self.publish(current.with_entry(Arc::new(entry)));

        info!(
            tenant_id = %self.tenant_id,
            domain = %domain,
            enabled = outcome == AddOutcome::Added,
            "user store added to chain"
        );
        Event::builder(EventType::UserStoreAdded)
            .tenant(self.tenant_id)
            .domain(domain.as_str())
            .detail("enabled", (outcome == AddOutcome::Added).to_string())
            .build()
            .emit();
        for listener in self.listeners() {
            listener.on_store_added(self.tenant_id, &domain).await;
        }
        drop(guard);
        Ok(outcome)
    }

    /// Removes the secondary store of `domain` (case-insensitive).
    ///
    /// Returns `false` if no store has that domain.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidDomainName` for a blank name and `CannotRemovePrimary`
    /// for the primary store's domain.
    pub async fn remove_secondary(&self, domain: &str) -> RealmResult<bool> {
        let domain =
            DomainName::new(domain).map_err(|_| RealmError::InvalidDomainName(domain.to_string()))?;

        let guard = self.mutation.lock().await;
        let current = self.snapshot();
        if current.primary().is_some_and(|p| p.domain() == &domain) {
            return Err(RealmError::CannotRemovePrimary(domain));
        }

        let (next, removed) = current.without_domain(&domain);
        let Some(removed) = removed else {
            debug!(tenant_id = %self.tenant_id, domain = %domain, "no user store to remove");
            return Ok(false);
        };
        self.publish(next);

        info!(
            tenant_id = %self.tenant_id,
            domain = %domain,
            was_enabled = removed.is_enabled(),
            "user store removed from chain"
        );
        Event::builder(EventType::UserStoreRemoved)
            .tenant(self.tenant_id)
            .domain(domain.as_str())
            .build()
            .emit();
        for listener in self.listeners() {
            listener.on_store_removed(self.tenant_id, &domain).await;
        }
        drop(guard);
        Ok(true)
    }

    /// Finds the store owning the user with this unique ID.
    ///
    /// ## Errors
    ///
    /// Returns a resolver `InvalidArgument` error for an empty ID.
    pub async fn store_for_user_id(&self, user_id: &str) -> RealmResult<Option<Arc<ChainNode>>> {
        self.store_for_entity(EntityKind::User, user_id).await
    }

    /// Finds the store owning the group with this unique ID.
    ///
    /// ## Errors
    ///
    /// Returns a resolver `InvalidArgument` error for an empty ID.
    pub async fn store_for_group_id(&self, group_id: &str) -> RealmResult<Option<Arc<ChainNode>>> {
        self.store_for_entity(EntityKind::Group, group_id).await
    }

    const fn resolver(&self, kind: EntityKind) -> Option<&UniqueIdDomainResolver> {
        match kind {
            EntityKind::User => self.user_resolver.as_ref(),
            EntityKind::Group => self.group_resolver.as_ref(),
        }
    }

    async fn store_for_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> RealmResult<Option<Arc<ChainNode>>> {
        if entity_id.is_empty() {
            let err = ResolverError::invalid_argument(format!("{kind} unique ID cannot be empty"));
            return Err(err.into());
        }
        let snapshot = self.snapshot();

        if let Some(resolver) = self.resolver(kind) {
            match resolver.get_domain(entity_id, self.tenant_id).await {
                Ok(Some(domain)) => {
                    if let Some(node) = snapshot.node(&domain) {
                        return Ok(Some(Arc::clone(node)));
                    }
                    debug!(
                        tenant_id = %self.tenant_id,
                        entity_id,
                        domain = %domain,
                        "mapped domain is not in the chain, evicting"
                    );
                    if let Err(e) = resolver.evict(entity_id, self.tenant_id).await {
                        warn!(tenant_id = %self.tenant_id, entity_id, error = %e, "stale mapping eviction failed");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(
                    tenant_id = %self.tenant_id,
                    entity_id,
                    error = %e,
                    "domain lookup failed, searching the chain"
                ),
            }
        }

        for node in snapshot.nodes() {
            let found = match kind {
                EntityKind::User => node.is_existing_user_with_id(entity_id).await,
                EntityKind::Group => node.is_existing_group_with_id(entity_id).await,
            };
            match found {
                Ok(true) => {
                    self.record(kind, entity_id, node).await;
                    return Ok(Some(Arc::clone(node)));
                }
                Ok(false) => {}
                Err(e) => warn!(
                    tenant_id = %self.tenant_id,
                    domain = %node.domain(),
                    entity_id,
                    error = %e,
                    "user store lookup failed"
                ),
            }
        }
        debug!(tenant_id = %self.tenant_id, %kind, entity_id, "no user store owns the id");
        Ok(None)
    }

    async fn record(&self, kind: EntityKind, entity_id: &str, node: &ChainNode) {
        let Some(resolver) = self.resolver(kind) else {
            return;
        };
        let cache_only = !node.is_unique_id_supported();
        if let Err(e) = resolver
            .set_domain(entity_id, node.domain().as_str(), self.tenant_id, cache_only)
            .await
        {
            warn!(
                tenant_id = %self.tenant_id,
                domain = %node.domain(),
                entity_id,
                error = %e,
                "cannot record domain mapping"
            );
        }
    }

    /// Checks a credential against the chain.
    ///
    /// `DOMAIN/name` goes straight to that domain's store. A bare name is
    /// tried on every store in chain order until one accepts it. Returns the
    /// accepting domain, or `None` if every store rejected the credential.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidDomainName` if the domain prefix is blank.
    pub async fn authenticate(
        &self,
        username: &str,
        credential: &Credential,
    ) -> RealmResult<Option<DomainName>> {
        let name = QualifiedName::parse(username)
            .map_err(|_| RealmError::InvalidDomainName(username.to_string()))?;
        let snapshot = self.snapshot();

        if let Some(domain) = &name.domain {
            let Some(node) = snapshot.node(domain) else {
                debug!(tenant_id = %self.tenant_id, domain = %domain, "no enabled user store for domain");
                return Ok(None);
            };
            return Ok(self
                .authenticate_on(node, &name.name, credential)
                .await
                .then(|| domain.clone()));
        }

        for node in snapshot.nodes() {
            if self.authenticate_on(node, &name.name, credential).await {
                return Ok(Some(node.domain().clone()));
            }
        }
        Ok(None)
    }

    async fn authenticate_on(
        &self,
        node: &ChainNode,
        username: &str,
        credential: &Credential,
    ) -> bool {
        match node.authenticate(username, credential).await {
            Ok(true) => {
                match node.get_user_id(username).await {
                    Ok(Some(user_id)) => self.record(EntityKind::User, &user_id, node).await,
                    Ok(None) => {}
                    Err(e) => debug!(domain = %node.domain(), error = %e, "cannot read user id"),
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(
                    tenant_id = %self.tenant_id,
                    domain = %node.domain(),
                    error = %e,
                    "authentication failed on user store"
                );
                false
            }
        }
    }
}
