//! The user store chain.
//!
//! Every configured store is one [`StoreEntry`] holding its configuration
//! and, when it serves requests, its manager. A [`ChainSnapshot`] keeps the
//! entries in configuration order and derives the manager chain from them,
//! so the two can never disagree on order or membership.
//!
//! [`ChainNode`] is the linked form of the manager chain: each node wraps
//! one manager and optionally points at the next node. It implements
//! [`UserStoreManager`] by forwarding every call to the wrapped manager.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use us_core::TenantId;
use us_model::{Claims, Credential, DomainName, User, UserStoreConfig};
use us_storage::{StorageResult, UserStoreManager};

/// One configured user store.
pub struct StoreEntry {
    domain: DomainName,
    config: UserStoreConfig,
    manager: Option<Arc<dyn UserStoreManager>>,
}

impl std::fmt::Debug for StoreEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEntry")
            .field("domain", &self.domain)
            .field("store_type", &self.config.store_type)
            .field("primary", &self.config.primary)
            .field("disabled", &self.config.disabled)
            .field("has_manager", &self.manager.is_some())
            .finish()
    }
}

impl StoreEntry {
    /// Creates an entry serving requests through `manager`.
    #[must_use]
    pub fn active(
        domain: DomainName,
        config: UserStoreConfig,
        manager: Arc<dyn UserStoreManager>,
    ) -> Self {
        Self {
            domain,
            config,
            manager: Some(manager),
        }
    }

    /// Creates a configuration-only entry that serves no requests.
    ///
    /// Used for disabled stores and for a primary without a store type.
    #[must_use]
    pub const fn config_only(domain: DomainName, config: UserStoreConfig) -> Self {
        Self {
            domain,
            config,
            manager: None,
        }
    }

    /// Domain of the store.
    #[must_use]
    pub const fn domain(&self) -> &DomainName {
        &self.domain
    }

    /// Configuration of the store.
    #[must_use]
    pub const fn config(&self) -> &UserStoreConfig {
        &self.config
    }

    /// Manager, if the store serves requests.
    #[must_use]
    pub const fn manager(&self) -> Option<&Arc<dyn UserStoreManager>> {
        self.manager.as_ref()
    }

    /// Whether the store takes part in the manager chain.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.manager.is_some() && !(self.config.disabled && !self.config.primary)
    }
}

/// An enabled entry paired with its manager.
#[derive(Clone)]
pub struct ChainLink {
    entry: Arc<StoreEntry>,
    manager: Arc<dyn UserStoreManager>,
}

impl std::fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ChainLink").field(&self.entry.domain).finish()
    }
}

impl ChainLink {
    /// Creates a link for `entry`, or `None` if it serves no requests.
    #[must_use]
    pub fn new(entry: Arc<StoreEntry>) -> Option<Self> {
        if !entry.is_enabled() {
            return None;
        }
        let manager = Arc::clone(entry.manager.as_ref()?);
        Some(Self { entry, manager })
    }

    /// The wrapped entry.
    #[must_use]
    pub const fn entry(&self) -> &Arc<StoreEntry> {
        &self.entry
    }
}

/// A node of the manager chain.
#[derive(Debug, Clone)]
pub enum ChainNode {
    /// The last node.
    Leaf(ChainLink),
    /// A node followed by another.
    Chained(ChainLink, Arc<ChainNode>),
}

impl ChainNode {
    /// The link held by this node.
    #[must_use]
    pub const fn link(&self) -> &ChainLink {
        match self {
            Self::Leaf(link) | Self::Chained(link, _) => link,
        }
    }

    /// Domain of the wrapped store.
    #[must_use]
    pub fn domain(&self) -> &DomainName {
        self.link().entry.domain()
    }

    /// The wrapped manager.
    #[must_use]
    pub fn manager(&self) -> &Arc<dyn UserStoreManager> {
        &self.link().manager
    }

    /// The following node, if any.
    #[must_use]
    pub const fn next(&self) -> Option<&Arc<Self>> {
        match self {
            Self::Leaf(_) => None,
            Self::Chained(_, next) => Some(next),
        }
    }

    /// Returns a copy of this node pointing at `next`.
    ///
    /// An existing node is linked as-is, never wrapped again.
    #[must_use]
    pub fn with_next(&self, next: Option<Arc<Self>>) -> Self {
        let link = self.link().clone();
        match next {
            Some(next) => Self::Chained(link, next),
            None => Self::Leaf(link),
        }
    }

    /// Iterates from this node to the end of the chain.
    #[must_use]
    pub const fn iter(&self) -> ChainIter<'_> {
        ChainIter { next: Some(self) }
    }
}

/// Iterator over a chain, head first.
#[derive(Debug)]
pub struct ChainIter<'a> {
    next: Option<&'a ChainNode>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a ChainNode;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next().map(AsRef::as_ref);
        Some(current)
    }
}

/// An immutable view of a realm's stores.
#[derive(Debug, Default)]
pub struct ChainSnapshot {
    entries: Vec<Arc<StoreEntry>>,
    head: Option<Arc<ChainNode>>,
    index: HashMap<DomainName, Arc<ChainNode>>,
}

impl ChainSnapshot {
    /// Builds the manager chain and domain index from `entries`.
    ///
    /// Entries are expected to have distinct domains; the first entry is the
    /// primary store.
    #[must_use]
    pub fn from_entries(entries: Vec<Arc<StoreEntry>>) -> Self {
        let mut index = HashMap::new();
        let mut head: Option<Arc<ChainNode>> = None;
        for entry in entries.iter().rev() {
            let Some(link) = ChainLink::new(Arc::clone(entry)) else {
                continue;
            };
            let node = Arc::new(match head.take() {
                Some(next) => ChainNode::Chained(link, next),
                None => ChainNode::Leaf(link),
            });
            index.insert(entry.domain().clone(), Arc::clone(&node));
            head = Some(node);
        }
        Self {
            entries,
            head,
            index,
        }
    }

    /// Head of the manager chain.
    #[must_use]
    pub const fn head(&self) -> Option<&Arc<ChainNode>> {
        self.head.as_ref()
    }

    /// Enabled node serving `domain`.
    #[must_use]
    pub fn node(&self, domain: &DomainName) -> Option<&Arc<ChainNode>> {
        self.index.get(domain)
    }

    /// All entries in configuration order.
    #[must_use]
    pub fn entries(&self) -> &[Arc<StoreEntry>] {
        &self.entries
    }

    /// The primary entry.
    #[must_use]
    pub fn primary(&self) -> Option<&Arc<StoreEntry>> {
        self.entries.first()
    }

    /// Whether any entry, enabled or not, uses `domain`.
    #[must_use]
    pub fn contains_domain(&self, domain: &DomainName) -> bool {
        self.entries.iter().any(|e| e.domain() == domain)
    }

    /// Domains of the manager chain, head first.
    #[must_use]
    pub fn domains(&self) -> Vec<DomainName> {
        self.iter().map(|node| node.domain().clone()).collect()
    }

    /// Domains of every entry, in configuration order.
    #[must_use]
    pub fn config_domains(&self) -> Vec<DomainName> {
        self.entries.iter().map(|e| e.domain().clone()).collect()
    }

    /// Number of nodes in the manager chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the manager chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterates the manager chain, head first.
    pub fn iter(&self) -> impl Iterator<Item = &ChainNode> {
        self.nodes().map(AsRef::as_ref)
    }

    /// Iterates the shared nodes of the manager chain, head first.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<ChainNode>> {
        std::iter::successors(self.head.as_ref(), |node| node.next())
    }

    /// Returns a snapshot with `entry` appended at the tail.
    #[must_use]
    pub fn with_entry(&self, entry: Arc<StoreEntry>) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self::from_entries(entries)
    }

    /// Returns a snapshot without the entry for `domain`, and that entry.
    #[must_use]
    pub fn without_domain(&self, domain: &DomainName) -> (Self, Option<Arc<StoreEntry>>) {
        let mut removed = None;
        let entries = self
            .entries
            .iter()
            .filter(|e| {
                if removed.is_none() && e.domain() == domain {
                    removed = Some(Arc::clone(e));
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();
        (Self::from_entries(entries), removed)
    }
}

#[async_trait]
impl UserStoreManager for ChainNode {
    async fn authenticate(&self, username: &str, credential: &Credential) -> StorageResult<bool> {
        self.manager().authenticate(username, credential).await
    }

    async fn authenticate_with_id(
        &self,
        user_id: &str,
        credential: &Credential,
    ) -> StorageResult<bool> {
        self.manager().authenticate_with_id(user_id, credential).await
    }

    async fn add_user(
        &self,
        username: &str,
        credential: &Credential,
        roles: &[String],
        claims: &Claims,
        profile: Option<&str>,
    ) -> StorageResult<User> {
        self.manager()
            .add_user(username, credential, roles, claims, profile)
            .await
    }

    async fn delete_user(&self, username: &str) -> StorageResult<()> {
        self.manager().delete_user(username).await
    }

    async fn delete_user_with_id(&self, user_id: &str) -> StorageResult<()> {
        self.manager().delete_user_with_id(user_id).await
    }

    async fn update_credential(
        &self,
        username: &str,
        new_credential: &Credential,
        old_credential: &Credential,
    ) -> StorageResult<()> {
        self.manager()
            .update_credential(username, new_credential, old_credential)
            .await
    }

    async fn update_credential_by_admin(
        &self,
        username: &str,
        new_credential: &Credential,
    ) -> StorageResult<()> {
        self.manager()
            .update_credential_by_admin(username, new_credential)
            .await
    }

    async fn list_users(&self, filter: &str, max_items: usize) -> StorageResult<Vec<String>> {
        self.manager().list_users(filter, max_items).await
    }

    async fn count_users(&self, filter: &str) -> StorageResult<u64> {
        self.manager().count_users(filter).await
    }

    async fn get_user_id(&self, username: &str) -> StorageResult<Option<String>> {
        self.manager().get_user_id(username).await
    }

    async fn get_username(&self, user_id: &str) -> StorageResult<Option<String>> {
        self.manager().get_username(user_id).await
    }

    async fn is_existing_user_with_id(&self, user_id: &str) -> StorageResult<bool> {
        self.manager().is_existing_user_with_id(user_id).await
    }

    async fn is_existing_group_with_id(&self, group_id: &str) -> StorageResult<bool> {
        self.manager().is_existing_group_with_id(group_id).await
    }

    async fn get_user_claim_values(
        &self,
        username: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<Claims> {
        self.manager()
            .get_user_claim_values(username, claims, profile)
            .await
    }

    async fn get_user_claim_values_with_id(
        &self,
        user_id: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<Claims> {
        self.manager()
            .get_user_claim_values_with_id(user_id, claims, profile)
            .await
    }

    async fn set_user_claim_values(
        &self,
        username: &str,
        claims: &Claims,
        profile: Option<&str>,
    ) -> StorageResult<()> {
        self.manager()
            .set_user_claim_values(username, claims, profile)
            .await
    }

    async fn delete_user_claim_values(
        &self,
        username: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<()> {
        self.manager()
            .delete_user_claim_values(username, claims, profile)
            .await
    }

    async fn get_profile_names(&self, username: &str) -> StorageResult<Vec<String>> {
        self.manager().get_profile_names(username).await
    }

    async fn add_role(&self, role: &str, usernames: &[String]) -> StorageResult<()> {
        self.manager().add_role(role, usernames).await
    }

    async fn delete_role(&self, role: &str) -> StorageResult<()> {
        self.manager().delete_role(role).await
    }

    async fn update_role_name(&self, role: &str, new_role: &str) -> StorageResult<()> {
        self.manager().update_role_name(role, new_role).await
    }

    async fn update_user_list_of_role(
        &self,
        role: &str,
        deleted_users: &[String],
        new_users: &[String],
    ) -> StorageResult<()> {
        self.manager()
            .update_user_list_of_role(role, deleted_users, new_users)
            .await
    }

    async fn update_role_list_of_user(
        &self,
        username: &str,
        deleted_roles: &[String],
        new_roles: &[String],
    ) -> StorageResult<()> {
        self.manager()
            .update_role_list_of_user(username, deleted_roles, new_roles)
            .await
    }

    async fn get_role_names(&self, filter: &str, max_items: usize) -> StorageResult<Vec<String>> {
        self.manager().get_role_names(filter, max_items).await
    }

    async fn get_role_list_of_user(&self, username: &str) -> StorageResult<Vec<String>> {
        self.manager().get_role_list_of_user(username).await
    }

    async fn count_roles(&self, filter: &str) -> StorageResult<u64> {
        self.manager().count_roles(filter).await
    }

    async fn add_remember_me(&self, username: &str, token: &str) -> StorageResult<()> {
        self.manager().add_remember_me(username, token).await
    }

    async fn is_valid_remember_me_token(
        &self,
        username: &str,
        token: &str,
    ) -> StorageResult<bool> {
        self.manager().is_valid_remember_me_token(username, token).await
    }

    fn tenant_id(&self) -> TenantId {
        self.manager().tenant_id()
    }

    fn realm_config(&self) -> &UserStoreConfig {
        self.manager().realm_config()
    }

    async fn is_read_only(&self) -> StorageResult<bool> {
        self.manager().is_read_only().await
    }

    async fn is_bulk_import_supported(&self) -> StorageResult<bool> {
        self.manager().is_bulk_import_supported().await
    }

    fn is_unique_id_supported(&self) -> bool {
        self.manager().is_unique_id_supported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use us_storage::InMemoryUserStoreManager;

    fn entry(domain: &str) -> Arc<StoreEntry> {
        let domain = DomainName::new(domain).unwrap();
        let config = UserStoreConfig::builder()
            .domain(domain.clone())
            .store_type("memory")
            .build();
        let manager = Arc::new(InMemoryUserStoreManager::new(config.clone(), TenantId(1)));
        Arc::new(StoreEntry::active(domain, config, manager))
    }

    fn disabled(domain: &str) -> Arc<StoreEntry> {
        let domain = DomainName::new(domain).unwrap();
        let config = UserStoreConfig::builder()
            .domain(domain.clone())
            .disabled(true)
            .build();
        Arc::new(StoreEntry::config_only(domain, config))
    }

    fn names(domains: &[DomainName]) -> Vec<&str> {
        domains.iter().map(DomainName::as_str).collect()
    }

    #[test]
    fn snapshot_links_enabled_entries_in_order() {
        let snapshot =
            ChainSnapshot::from_entries(vec![entry("PRIMARY"), disabled("OFF"), entry("LDAP")]);

        assert_eq!(names(&snapshot.domains()), ["PRIMARY", "LDAP"]);
        assert_eq!(names(&snapshot.config_domains()), ["PRIMARY", "OFF", "LDAP"]);
        assert_eq!(snapshot.len(), 2);

        let head = snapshot.head().unwrap();
        assert_eq!(head.domain().as_str(), "PRIMARY");
        let next = head.next().unwrap();
        assert_eq!(next.domain().as_str(), "LDAP");
        assert!(next.next().is_none());
        assert!(matches!(next.as_ref(), ChainNode::Leaf(_)));

        assert!(snapshot.node(&DomainName::new("OFF").unwrap()).is_none());
        assert!(snapshot.contains_domain(&DomainName::new("off").unwrap()));
    }

    #[test]
    fn with_next_reuses_existing_node() {
        let snapshot = ChainSnapshot::from_entries(vec![entry("A"), entry("B")]);
        let tail = Arc::clone(snapshot.node(&DomainName::new("B").unwrap()).unwrap());
        let head = snapshot.head().unwrap();

        let relinked = head.with_next(Some(Arc::clone(&tail)));
        assert!(Arc::ptr_eq(relinked.next().unwrap(), &tail));

        let leaf = head.with_next(None);
        assert!(leaf.next().is_none());
        assert_eq!(leaf.domain().as_str(), "A");
    }

    #[test]
    fn append_and_remove_keep_order() {
        let snapshot = ChainSnapshot::from_entries(vec![entry("A"), entry("B")]);
        let grown = snapshot.with_entry(entry("C"));
        assert_eq!(names(&grown.domains()), ["A", "B", "C"]);

        let (shrunk, removed) = grown.without_domain(&DomainName::new("B").unwrap());
        assert_eq!(removed.map(|e| e.domain().to_string()).as_deref(), Some("B"));
        assert_eq!(names(&shrunk.domains()), ["A", "C"]);
        assert_eq!(names(&shrunk.config_domains()), ["A", "C"]);

        // The original snapshot is untouched.
        assert_eq!(names(&snapshot.domains()), ["A", "B"]);
    }

    #[tokio::test]
    async fn node_forwards_to_wrapped_manager() {
        let snapshot = ChainSnapshot::from_entries(vec![entry("A")]);
        let node = snapshot.head().unwrap();

        let user = node
            .add_user("alice", &Credential::new("pw"), &[], &Claims::new(), None)
            .await
            .unwrap();
        assert!(node.authenticate("alice", &Credential::new("pw")).await.unwrap());
        assert!(node.is_existing_user_with_id(&user.user_id).await.unwrap());
        assert_eq!(node.tenant_id(), TenantId(1));
        assert_eq!(node.realm_config().store_type.as_deref(), Some("memory"));
        assert_eq!(node.list_users("*", 10).await.unwrap(), vec!["alice".to_string()]);
    }
}
