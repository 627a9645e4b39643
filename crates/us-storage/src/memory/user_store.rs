use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use us_core::TenantId;
use us_model::{Claims, Credential, User, UserStoreConfig};
use uuid::Uuid;

use super::matches_filter;
use crate::error::{StorageError, StorageResult};
use crate::manager::UserStoreManager;

/// Claim profile used when callers pass none.
pub const DEFAULT_PROFILE: &str = "default";

/// Store property marking a store read-only.
pub const PROPERTY_READ_ONLY: &str = "ReadOnly";

/// Store property enabling bulk import.
pub const PROPERTY_BULK_IMPORT: &str = "IsBulkImportSupported";

struct StoredUser {
    user_id: String,
    credential: Credential,
    profiles: HashMap<String, Claims>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, StoredUser>,
    roles: BTreeMap<String, BTreeSet<String>>,
    groups: HashMap<String, String>,
    remember_me: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn user(&self, username: &str) -> StorageResult<&StoredUser> {
        self.users
            .get(username)
            .ok_or_else(|| StorageError::not_found("User", username))
    }

    fn user_mut(&mut self, username: &str) -> StorageResult<&mut StoredUser> {
        self.users
            .get_mut(username)
            .ok_or_else(|| StorageError::not_found("User", username))
    }

    fn username_of(&self, user_id: &str) -> Option<&str> {
        self.users
            .iter()
            .find(|(_, user)| user.user_id == user_id)
            .map(|(name, _)| name.as_str())
    }

    fn remove_user(&mut self, username: &str) -> StorageResult<()> {
        self.users
            .remove(username)
            .ok_or_else(|| StorageError::not_found("User", username))?;
        for members in self.roles.values_mut() {
            members.remove(username);
        }
        self.remember_me.remove(username);
        Ok(())
    }

    fn claims(
        &self,
        username: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<Claims> {
        let user = self.user(username)?;
        let Some(values) = user.profiles.get(profile.unwrap_or(DEFAULT_PROFILE)) else {
            return Ok(Claims::new());
        };
        if claims.is_empty() {
            return Ok(values.clone());
        }
        Ok(claims
            .iter()
            .filter_map(|uri| values.get(uri).map(|v| (uri.clone(), v.clone())))
            .collect())
    }
}

/// A complete user store held in memory.
///
/// Reads [`PROPERTY_READ_ONLY`] and [`PROPERTY_BULK_IMPORT`] from its
/// configuration.
pub struct InMemoryUserStoreManager {
    config: UserStoreConfig,
    tenant_id: TenantId,
    unique_id_supported: bool,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for InMemoryUserStoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserStoreManager")
            .field("domain", &self.config.effective_domain())
            .field("tenant_id", &self.tenant_id)
            .field("unique_id_supported", &self.unique_id_supported)
            .finish_non_exhaustive()
    }
}

impl InMemoryUserStoreManager {
    /// Creates an empty store with stable unique IDs.
    #[must_use]
    pub fn new(config: UserStoreConfig, tenant_id: TenantId) -> Self {
        Self {
            config,
            tenant_id,
            unique_id_supported: true,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Sets whether the IDs this store issues are stable.
    #[must_use]
    pub const fn with_unique_id_support(mut self, supported: bool) -> Self {
        self.unique_id_supported = supported;
        self
    }

    /// Adds a group and returns its unique ID.
    pub fn add_group(&self, name: &str) -> String {
        let group_id = Uuid::now_v7().to_string();
        self.inner.write().groups.insert(group_id.clone(), name.to_string());
        group_id
    }

    /// Number of users in the store.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.inner.read().users.len()
    }

    fn domain_label(&self) -> String {
        self.config
            .effective_domain()
            .map_or_else(|| "unknown".to_string(), |d| d.to_string())
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.config.get_bool(PROPERTY_READ_ONLY).unwrap_or(false) {
            return Err(StorageError::ReadOnly(self.domain_label()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStoreManager for InMemoryUserStoreManager {
    async fn authenticate(&self, username: &str, credential: &Credential) -> StorageResult<bool> {
        let inner = self.inner.read();
        Ok(inner
            .users
            .get(username)
            .is_some_and(|user| user.credential == *credential))
    }

    async fn authenticate_with_id(
        &self,
        user_id: &str,
        credential: &Credential,
    ) -> StorageResult<bool> {
        let inner = self.inner.read();
        Ok(inner
            .users
            .values()
            .any(|user| user.user_id == user_id && user.credential == *credential))
    }

    async fn add_user(
        &self,
        username: &str,
        credential: &Credential,
        roles: &[String],
        claims: &Claims,
        profile: Option<&str>,
    ) -> StorageResult<User> {
        self.check_writable()?;
        if username.is_empty() {
            return Err(StorageError::InvalidData("username cannot be empty".to_string()));
        }
        let mut inner = self.inner.write();
        if inner.users.contains_key(username) {
            return Err(StorageError::duplicate("User", "username", username));
        }
        let user_id = Uuid::now_v7().to_string();
        let mut profiles = HashMap::new();
        profiles.insert(
            profile.unwrap_or(DEFAULT_PROFILE).to_string(),
            claims.clone(),
        );
        inner.users.insert(
            username.to_string(),
            StoredUser {
                user_id: user_id.clone(),
                credential: credential.clone(),
                profiles,
            },
        );
        for role in roles {
            inner
                .roles
                .entry(role.clone())
                .or_default()
                .insert(username.to_string());
        }
        debug!(domain = %self.domain_label(), username, user_id, "user added");
        Ok(User {
            user_id,
            username: username.to_string(),
            claims: claims.clone(),
        })
    }

    async fn delete_user(&self, username: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.inner.write().remove_user(username)
    }

    async fn delete_user_with_id(&self, user_id: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        let username = inner
            .username_of(user_id)
            .map(str::to_string)
            .ok_or_else(|| StorageError::not_found("User", user_id))?;
        inner.remove_user(&username)
    }

    async fn update_credential(
        &self,
        username: &str,
        new_credential: &Credential,
        old_credential: &Credential,
    ) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        let user = inner.user_mut(username)?;
        if user.credential != *old_credential {
            return Err(StorageError::InvalidData(format!(
                "old credential does not match for user '{username}'"
            )));
        }
        user.credential = new_credential.clone();
        Ok(())
    }

    async fn update_credential_by_admin(
        &self,
        username: &str,
        new_credential: &Credential,
    ) -> StorageResult<()> {
        self.check_writable()?;
        self.inner.write().user_mut(username)?.credential = new_credential.clone();
        Ok(())
    }

    async fn list_users(&self, filter: &str, max_items: usize) -> StorageResult<Vec<String>> {
        let inner = self.inner.read();
        let mut names: Vec<String> = inner
            .users
            .keys()
            .filter(|name| matches_filter(filter, name))
            .cloned()
            .collect();
        names.sort();
        names.truncate(max_items);
        Ok(names)
    }

    async fn count_users(&self, filter: &str) -> StorageResult<u64> {
        let inner = self.inner.read();
        Ok(inner
            .users
            .keys()
            .filter(|name| matches_filter(filter, name))
            .count() as u64)
    }

    async fn get_user_id(&self, username: &str) -> StorageResult<Option<String>> {
        Ok(self
            .inner
            .read()
            .users
            .get(username)
            .map(|user| user.user_id.clone()))
    }

    async fn get_username(&self, user_id: &str) -> StorageResult<Option<String>> {
        Ok(self.inner.read().username_of(user_id).map(str::to_string))
    }

    async fn is_existing_user_with_id(&self, user_id: &str) -> StorageResult<bool> {
        Ok(self.inner.read().username_of(user_id).is_some())
    }

    async fn is_existing_group_with_id(&self, group_id: &str) -> StorageResult<bool> {
        Ok(self.inner.read().groups.contains_key(group_id))
    }

    async fn get_user_claim_values(
        &self,
        username: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<Claims> {
        self.inner.read().claims(username, claims, profile)
    }

    async fn get_user_claim_values_with_id(
        &self,
        user_id: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<Claims> {
        let inner = self.inner.read();
        let username = inner
            .username_of(user_id)
            .ok_or_else(|| StorageError::not_found("User", user_id))?;
        inner.claims(username, claims, profile)
    }

    async fn set_user_claim_values(
        &self,
        username: &str,
        claims: &Claims,
        profile: Option<&str>,
    ) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        let values = inner
            .user_mut(username)?
            .profiles
            .entry(profile.unwrap_or(DEFAULT_PROFILE).to_string())
            .or_default();
        values.extend(claims.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn delete_user_claim_values(
        &self,
        username: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        if let Some(values) = inner
            .user_mut(username)?
            .profiles
            .get_mut(profile.unwrap_or(DEFAULT_PROFILE))
        {
            for uri in claims {
                values.remove(uri);
            }
        }
        Ok(())
    }

    async fn get_profile_names(&self, username: &str) -> StorageResult<Vec<String>> {
        let inner = self.inner.read();
        let mut names: Vec<String> = inner.user(username)?.profiles.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn add_role(&self, role: &str, usernames: &[String]) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        if inner.roles.contains_key(role) {
            return Err(StorageError::duplicate("Role", "name", role));
        }
        if let Some(missing) = usernames.iter().find(|u| !inner.users.contains_key(*u)) {
            return Err(StorageError::not_found("User", missing.as_str()));
        }
        inner
            .roles
            .insert(role.to_string(), usernames.iter().cloned().collect());
        Ok(())
    }

    async fn delete_role(&self, role: &str) -> StorageResult<()> {
        self.check_writable()?;
        self.inner
            .write()
            .roles
            .remove(role)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("Role", role))
    }

    async fn update_role_name(&self, role: &str, new_role: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        if inner.roles.contains_key(new_role) {
            return Err(StorageError::duplicate("Role", "name", new_role));
        }
        let members = inner
            .roles
            .remove(role)
            .ok_or_else(|| StorageError::not_found("Role", role))?;
        inner.roles.insert(new_role.to_string(), members);
        Ok(())
    }

    async fn update_user_list_of_role(
        &self,
        role: &str,
        deleted_users: &[String],
        new_users: &[String],
    ) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        if let Some(missing) = new_users.iter().find(|u| !inner.users.contains_key(*u)) {
            return Err(StorageError::not_found("User", missing.as_str()));
        }
        let members = inner
            .roles
            .get_mut(role)
            .ok_or_else(|| StorageError::not_found("Role", role))?;
        for user in deleted_users {
            members.remove(user);
        }
        members.extend(new_users.iter().cloned());
        Ok(())
    }

    async fn update_role_list_of_user(
        &self,
        username: &str,
        deleted_roles: &[String],
        new_roles: &[String],
    ) -> StorageResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        inner.user(username)?;
        if let Some(missing) = new_roles.iter().find(|r| !inner.roles.contains_key(*r)) {
            return Err(StorageError::not_found("Role", missing.as_str()));
        }
        for role in deleted_roles {
            if let Some(members) = inner.roles.get_mut(role) {
                members.remove(username);
            }
        }
        for role in new_roles {
            if let Some(members) = inner.roles.get_mut(role) {
                members.insert(username.to_string());
            }
        }
        Ok(())
    }

    async fn get_role_names(&self, filter: &str, max_items: usize) -> StorageResult<Vec<String>> {
        let inner = self.inner.read();
        Ok(inner
            .roles
            .keys()
            .filter(|name| matches_filter(filter, name))
            .take(max_items)
            .cloned()
            .collect())
    }

    async fn get_role_list_of_user(&self, username: &str) -> StorageResult<Vec<String>> {
        let inner = self.inner.read();
        inner.user(username)?;
        Ok(inner
            .roles
            .iter()
            .filter(|(_, members)| members.contains(username))
            .map(|(role, _)| role.clone())
            .collect())
    }

    async fn count_roles(&self, filter: &str) -> StorageResult<u64> {
        let inner = self.inner.read();
        Ok(inner
            .roles
            .keys()
            .filter(|name| matches_filter(filter, name))
            .count() as u64)
    }

    async fn add_remember_me(&self, username: &str, token: &str) -> StorageResult<()> {
        let mut inner = self.inner.write();
        inner.user(username)?;
        inner
            .remember_me
            .entry(username.to_string())
            .or_default()
            .insert(token.to_string());
        Ok(())
    }

    async fn is_valid_remember_me_token(
        &self,
        username: &str,
        token: &str,
    ) -> StorageResult<bool> {
        Ok(self
            .inner
            .read()
            .remember_me
            .get(username)
            .is_some_and(|tokens| tokens.contains(token)))
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn realm_config(&self) -> &UserStoreConfig {
        &self.config
    }

    async fn is_read_only(&self) -> StorageResult<bool> {
        Ok(self.config.get_bool(PROPERTY_READ_ONLY).unwrap_or(false))
    }

    async fn is_bulk_import_supported(&self) -> StorageResult<bool> {
        Ok(self.config.get_bool(PROPERTY_BULK_IMPORT).unwrap_or(false))
    }

    fn is_unique_id_supported(&self) -> bool {
        self.unique_id_supported
    }
}
