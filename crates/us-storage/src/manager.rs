//! User store manager capability.

use async_trait::async_trait;
use us_core::TenantId;
use us_model::{Claims, Credential, User, UserStoreConfig};

use crate::error::StorageResult;

/// Operations offered by one user store (one domain).
///
/// Usernames passed here are never domain-qualified; routing a
/// `DOMAIN/name` to the right store is the realm's job.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait UserStoreManager: Send + Sync {
    // === Authentication ===

    /// Checks a credential.
    ///
    /// Returns `Ok(false)` for an unknown user or a wrong credential.
    async fn authenticate(&self, username: &str, credential: &Credential) -> StorageResult<bool>;

    /// Checks a credential for the user with this unique ID.
    async fn authenticate_with_id(
        &self,
        user_id: &str,
        credential: &Credential,
    ) -> StorageResult<bool>;

    // === Users ===

    /// Adds a user and returns it with its assigned unique ID.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the username exists and
    /// `StorageError::ReadOnly` on read-only stores.
    async fn add_user(
        &self,
        username: &str,
        credential: &Credential,
        roles: &[String],
        claims: &Claims,
        profile: Option<&str>,
    ) -> StorageResult<User>;

    /// Deletes a user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn delete_user(&self, username: &str) -> StorageResult<()>;

    /// Deletes the user with this unique ID.
    async fn delete_user_with_id(&self, user_id: &str) -> StorageResult<()>;

    /// Replaces a credential after checking the old one.
    async fn update_credential(
        &self,
        username: &str,
        new_credential: &Credential,
        old_credential: &Credential,
    ) -> StorageResult<()>;

    /// Replaces a credential without checking the old one.
    async fn update_credential_by_admin(
        &self,
        username: &str,
        new_credential: &Credential,
    ) -> StorageResult<()>;

    /// Lists usernames matching `filter` (`*` matches anything).
    async fn list_users(&self, filter: &str, max_items: usize) -> StorageResult<Vec<String>>;

    /// Counts users matching `filter`.
    async fn count_users(&self, filter: &str) -> StorageResult<u64>;

    /// Returns the unique ID of a user.
    async fn get_user_id(&self, username: &str) -> StorageResult<Option<String>>;

    /// Returns the username of the user with this unique ID.
    async fn get_username(&self, user_id: &str) -> StorageResult<Option<String>>;

    /// Returns whether a user with this unique ID lives in this store.
    async fn is_existing_user_with_id(&self, user_id: &str) -> StorageResult<bool>;

    /// Returns whether a group with this unique ID lives in this store.
    async fn is_existing_group_with_id(&self, group_id: &str) -> StorageResult<bool>;

    // === Claims ===

    /// Reads the requested claims of a user.
    async fn get_user_claim_values(
        &self,
        username: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<Claims>;

    /// Reads the requested claims of the user with this unique ID.
    async fn get_user_claim_values_with_id(
        &self,
        user_id: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<Claims>;

    /// Writes claims of a user.
    async fn set_user_claim_values(
        &self,
        username: &str,
        claims: &Claims,
        profile: Option<&str>,
    ) -> StorageResult<()>;

    /// Deletes claims of a user.
    async fn delete_user_claim_values(
        &self,
        username: &str,
        claims: &[String],
        profile: Option<&str>,
    ) -> StorageResult<()>;

    /// Returns the claim profile names of a user.
    async fn get_profile_names(&self, username: &str) -> StorageResult<Vec<String>>;

    // === Roles ===

    /// Adds a role with initial members.
    async fn add_role(&self, role: &str, usernames: &[String]) -> StorageResult<()>;

    /// Deletes a role.
    async fn delete_role(&self, role: &str) -> StorageResult<()>;

    /// Renames a role.
    async fn update_role_name(&self, role: &str, new_role: &str) -> StorageResult<()>;

    /// Edits the members of a role.
    async fn update_user_list_of_role(
        &self,
        role: &str,
        deleted_users: &[String],
        new_users: &[String],
    ) -> StorageResult<()>;

    /// Edits the roles of a user.
    async fn update_role_list_of_user(
        &self,
        username: &str,
        deleted_roles: &[String],
        new_roles: &[String],
    ) -> StorageResult<()>;

    /// Lists role names matching `filter`.
    async fn get_role_names(&self, filter: &str, max_items: usize) -> StorageResult<Vec<String>>;

    /// Returns the roles of a user.
    async fn get_role_list_of_user(&self, username: &str) -> StorageResult<Vec<String>>;

    /// Counts roles matching `filter`.
    async fn count_roles(&self, filter: &str) -> StorageResult<u64>;

    // === Remember-me ===

    /// Stores a remember-me token for a user.
    async fn add_remember_me(&self, username: &str, token: &str) -> StorageResult<()>;

    /// Checks a remember-me token.
    async fn is_valid_remember_me_token(&self, username: &str, token: &str)
        -> StorageResult<bool>;

    // === Store properties ===

    /// Tenant this store serves.
    fn tenant_id(&self) -> TenantId;

    /// Configuration the store was built from.
    fn realm_config(&self) -> &UserStoreConfig;

    /// Whether the store rejects writes.
    async fn is_read_only(&self) -> StorageResult<bool>;

    /// Whether the store accepts bulk user import.
    async fn is_bulk_import_supported(&self) -> StorageResult<bool>;

    /// Whether user and group IDs issued by this store are stable across
    /// restarts. Domain mappings of stores without stable IDs are kept in
    /// the cache only.
    fn is_unique_id_supported(&self) -> bool;
}
