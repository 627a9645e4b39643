//! Hot deployment of per-domain user store files.
//!
//! Each `*.toml` file in the deployment directory configures one secondary
//! store. The file stem names the domain, with `_` standing for `.`
//! (`ldap_example_com.toml` is `LDAP.EXAMPLE.COM`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use us_model::{DomainName, UserStoreConfig};

use crate::error::{RealmError, RealmResult};
use crate::realm::{AddOutcome, DefaultRealm};

const FILE_EXTENSION: &str = "toml";

/// Result of deploying a directory.
#[derive(Debug, Default)]
pub struct DeploymentReport {
    /// Files whose store is now configured, with the outcome.
    pub deployed: Vec<(PathBuf, AddOutcome)>,
    /// Files that could not be deployed.
    pub failed: Vec<(PathBuf, RealmError)>,
}

impl DeploymentReport {
    /// Whether every file was deployed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deploys and undeploys user store files into one realm.
#[derive(Debug, Clone)]
pub struct UserStoreDeploymentManager {
    realm: Arc<DefaultRealm>,
}

fn domain_from_path(path: &Path) -> RealmResult<DomainName> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RealmError::deployment(path, "file name is not valid UTF-8"))?;
    DomainName::from_file_stem(stem).map_err(|_| RealmError::InvalidDomainName(stem.to_string()))
}

fn is_store_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
}

impl UserStoreDeploymentManager {
    /// Creates a manager deploying into `realm`.
    #[must_use]
    pub const fn new(realm: Arc<DefaultRealm>) -> Self {
        Self { realm }
    }

    /// The realm files are deployed into.
    #[must_use]
    pub const fn realm(&self) -> &Arc<DefaultRealm> {
        &self.realm
    }

    /// Reads a store file and adds its store to the realm.
    ///
    /// A file without `domain_name` takes its domain from the file stem; a
    /// file whose `domain_name` disagrees with the stem is rejected.
    ///
    /// ## Errors
    ///
    /// Returns `Deployment` if the file cannot be read or parsed, and any
    /// error of [`DefaultRealm::add_secondary`].
    pub async fn deploy(&self, path: impl AsRef<Path>) -> RealmResult<AddOutcome> {
        let path = path.as_ref();
        let file_domain = domain_from_path(path)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RealmError::deployment(path, e.to_string()))?;
        let mut config = UserStoreConfig::from_toml_str(&content)
            .map_err(|e| RealmError::deployment(path, e.to_string()))?;

        match &config.domain_name {
            Some(declared) if *declared != file_domain => {
                return Err(RealmError::deployment(
                    path,
                    format!("declares domain {declared} but the file name implies {file_domain}"),
                ));
            }
            Some(_) => {}
            None => config.domain_name = Some(file_domain.clone()),
        }

        let outcome = self.realm.add_secondary(config).await?;
        info!(
            tenant_id = %self.realm.tenant_id(),
            domain = %file_domain,
            path = %path.display(),
            ?outcome,
            "user store file deployed"
        );
        Ok(outcome)
    }

    /// Removes the store a file configured.
    ///
    /// The file itself may already be gone; only its name is used.
    ///
    /// ## Errors
    ///
    /// Returns the errors of [`DefaultRealm::remove_secondary`].
    pub async fn undeploy(&self, path: impl AsRef<Path>) -> RealmResult<bool> {
        let path = path.as_ref();
        let domain = domain_from_path(path)?;
        let removed = self.realm.remove_secondary(domain.as_str()).await?;
        info!(
            tenant_id = %self.realm.tenant_id(),
            domain = %domain,
            path = %path.display(),
            removed,
            "user store file undeployed"
        );
        Ok(removed)
    }

    /// Deploys every `*.toml` file of `dir` in file name order.
    ///
    /// A file that fails is logged and reported; the rest still deploy.
    ///
    /// ## Errors
    ///
    /// Returns `Deployment` only if the directory itself cannot be listed.
    pub async fn deploy_dir(&self, dir: impl AsRef<Path>) -> RealmResult<DeploymentReport> {
        let dir = dir.as_ref();
        let mut listing = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| RealmError::deployment(dir, e.to_string()))?;

        let mut files = Vec::new();
        while let Some(entry) = listing
            .next_entry()
            .await
            .map_err(|e| RealmError::deployment(dir, e.to_string()))?
        {
            let path = entry.path();
            if is_store_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        let mut report = DeploymentReport::default();
        for path in files {
            match self.deploy(&path).await {
                Ok(outcome) => report.deployed.push((path, outcome)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "user store file not deployed");
                    report.failed.push((path, e));
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::StoreFactoryRegistry;
    use us_core::TenantId;
    use us_model::RealmConfig;

    async fn realm() -> Arc<DefaultRealm> {
        let config = RealmConfig::new(
            TenantId(7),
            UserStoreConfig::builder().store_type("memory").build(),
        )
        .with_authorization_manager("memory");
        Arc::new(
            DefaultRealm::builder(config, Arc::new(StoreFactoryRegistry::with_in_memory()))
                .build()
                .await
                .unwrap(),
        )
    }

    fn names(realm: &DefaultRealm) -> Vec<String> {
        realm.domains().iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn deploy_then_undeploy_restores_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ldap_example_com.toml");
        std::fs::write(&path, "store_type = \"memory\"\n").unwrap();

        let manager = UserStoreDeploymentManager::new(realm().await);
        let before = names(manager.realm());

        assert_eq!(manager.deploy(&path).await.unwrap(), AddOutcome::Added);
        assert_eq!(names(manager.realm()), ["PRIMARY", "LDAP.EXAMPLE.COM"]);

        std::fs::remove_file(&path).unwrap();
        assert!(manager.undeploy(&path).await.unwrap());
        assert_eq!(names(manager.realm()), before);
    }

    #[tokio::test]
    async fn declared_domain_must_match_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ldap.toml");
        std::fs::write(&path, "domain_name = \"jdbc\"\nstore_type = \"memory\"\n").unwrap();

        let manager = UserStoreDeploymentManager::new(realm().await);
        let err = manager.deploy(&path).await.unwrap_err();
        assert!(matches!(err, RealmError::Deployment { .. }));
        assert_eq!(manager.realm().chain_len(), 1);
    }

    #[tokio::test]
    async fn deploy_dir_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_store.toml"), "store_type = \"memory\"\n").unwrap();
        std::fs::write(dir.path().join("a_store.toml"), "store_type = \"memory\"\n").unwrap();
        std::fs::write(dir.path().join("broken.toml"), "store_type = [").unwrap();
        std::fs::write(
            dir.path().join("off.toml"),
            "store_type = \"memory\"\ndisabled = true\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let manager = UserStoreDeploymentManager::new(realm().await);
        let report = manager.deploy_dir(dir.path()).await.unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("broken.toml"));
        assert_eq!(report.deployed.len(), 3);
        assert_eq!(names(manager.realm()), ["PRIMARY", "A.STORE", "B.STORE"]);
        assert_eq!(manager.realm().config_domains().len(), 4);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let manager = UserStoreDeploymentManager::new(realm().await);
        let err = manager.deploy_dir("/nonexistent/userstores").await.unwrap_err();
        assert!(matches!(err, RealmError::Deployment { .. }));
    }
}
