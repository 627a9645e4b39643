//! In-memory realm lifecycle: configuration, deployment, resolution.

use std::sync::Arc;

use us_core::{Config, TenantId};
use us_model::{Claims, Credential, EntityKind, RealmConfig};
use us_realm::{AddOutcome, DefaultRealm, StoreFactoryRegistry, UserStoreDeploymentManager};
use us_storage::{DomainMappingStore, InMemoryDomainMappingStore, UserStoreManager};

use crate::common::{domain, init_tracing, memory_store, realm, realm_config, Resolvers, TENANT};

fn in_memory_resolvers() -> (Resolvers, Arc<InMemoryDomainMappingStore>) {
    let users = Arc::new(InMemoryDomainMappingStore::new(EntityKind::User));
    let groups = Arc::new(InMemoryDomainMappingStore::new(EntityKind::Group));
    (Resolvers::new(users.clone(), groups), users)
}

#[tokio::test]
async fn realm_from_toml_with_deployed_stores() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ldap_example.toml"), "store_type = \"memory\"\n").unwrap();
    std::fs::write(dir.path().join("partners.toml"), "store_type = \"memory\"\n").unwrap();

    let settings = Config::from_toml_str(&format!(
        "[deployment]\nuserstores_dir = {:?}\n",
        dir.path().display().to_string()
    ))
    .unwrap();
    let realm_config = RealmConfig::from_toml_str(
        r#"
        tenant_id = 42
        authorization_manager = "memory"

        [primary]
        store_type = "memory"

        [[secondaries]]
        domain_name = "jdbc"
        store_type = "memory"
        "#,
    )
    .unwrap();

    let (resolvers, _) = in_memory_resolvers();
    let realm = realm(realm_config, &resolvers).await;
    let deployer = UserStoreDeploymentManager::new(Arc::clone(&realm));

    let report = deployer
        .deploy_dir(settings.deployment.userstores_dir.unwrap())
        .await
        .unwrap();
    assert!(report.is_clean());

    let names: Vec<String> = realm.domains().iter().map(ToString::to_string).collect();
    assert_eq!(names, ["PRIMARY", "JDBC", "LDAP.EXAMPLE", "PARTNERS"]);
    assert_eq!(realm.tenant_id(), TENANT);
}

#[tokio::test]
async fn resolution_survives_undeploy_and_redeploy() {
    init_tracing();
    let (resolvers, user_table) = in_memory_resolvers();
    let realm = realm(realm_config(&["jdbc"]), &resolvers).await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("ldap.toml");
    std::fs::write(&file, "store_type = \"memory\"\n").unwrap();
    let deployer = UserStoreDeploymentManager::new(Arc::clone(&realm));

    assert_eq!(deployer.deploy(&file).await.unwrap(), AddOutcome::Added);
    let ldap = realm.user_store_for_domain(&domain("LDAP")).unwrap();
    let user = ldap
        .add_user("dora", &Credential::new("pw"), &["staff".to_string()], &Claims::new(), None)
        .await
        .unwrap();

    // Authentication records the owner of the user's ID.
    assert_eq!(
        realm.authenticate("dora", &Credential::new("pw")).await.unwrap(),
        Some(domain("LDAP"))
    );
    assert_eq!(user_table.get(&user.user_id, TENANT).await.unwrap(), Some(domain("LDAP")));
    let owner = realm.store_for_user_id(&user.user_id).await.unwrap().unwrap();
    assert_eq!(owner.domain(), &domain("LDAP"));

    // Once the store is gone the mapping is stale and gets evicted.
    assert!(deployer.undeploy(&file).await.unwrap());
    assert!(realm.store_for_user_id(&user.user_id).await.unwrap().is_none());
    assert!(user_table.is_empty());

    // Redeploying creates a fresh, empty store.
    assert_eq!(deployer.deploy(&file).await.unwrap(), AddOutcome::Added);
    assert_eq!(realm.chain_len(), 3);
    assert!(realm.store_for_user_id(&user.user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn realms_of_different_tenants_share_cache_service() {
    init_tracing();
    let (resolvers, user_table) = in_memory_resolvers();
    let first = realm(realm_config(&["ldap"]), &resolvers).await;

    let mut other_config = realm_config(&["jdbc"]);
    other_config.tenant_id = TenantId(43);
    let second = DefaultRealm::builder(other_config, Arc::new(StoreFactoryRegistry::with_in_memory()))
        .user_resolver(resolvers.users.clone())
        .build()
        .await
        .unwrap();

    let ldap = first.user_store_for_domain(&domain("LDAP")).unwrap();
    let jdbc = second.user_store_for_domain(&domain("JDBC")).unwrap();
    let a = ldap
        .add_user("erin", &Credential::new("pw"), &[], &Claims::new(), None)
        .await
        .unwrap();
    let b = jdbc
        .add_user("erin", &Credential::new("pw"), &[], &Claims::new(), None)
        .await
        .unwrap();

    assert_eq!(first.store_for_user_id(&a.user_id).await.unwrap().unwrap().domain(), &domain("LDAP"));
    assert_eq!(second.store_for_user_id(&b.user_id).await.unwrap().unwrap().domain(), &domain("JDBC"));
    assert_eq!(user_table.len(), 2);

    // Each tenant only sees its own mappings.
    assert_eq!(resolvers.users.get_domain(&a.user_id, TenantId(43)).await.unwrap(), None);
    assert!(second.store_for_user_id(&a.user_id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lookups_run_while_stores_are_deployed() {
    init_tracing();
    let (resolvers, _) = in_memory_resolvers();
    let realm = realm(realm_config(&["ldap"]), &resolvers).await;
    let ldap = realm.user_store_for_domain(&domain("LDAP")).unwrap();
    let user = ldap
        .add_user("finn", &Credential::new("pw"), &[], &Claims::new(), None)
        .await
        .unwrap();

    let mutations = {
        let realm = Arc::clone(&realm);
        tokio::spawn(async move {
            for i in 0..25 {
                let name = format!("TEMP{i}");
                realm.add_secondary(memory_store(&name)).await.unwrap();
                realm.remove_secondary(&name).await.unwrap();
            }
        })
    };
    let lookups = (0..8).map(|_| {
        let realm = Arc::clone(&realm);
        let user_id = user.user_id.clone();
        tokio::spawn(async move {
            for _ in 0..25 {
                let owner = realm.store_for_user_id(&user_id).await.unwrap().unwrap();
                assert_eq!(owner.domain().as_str(), "LDAP");
            }
        })
    });

    for result in futures::future::join_all(lookups).await {
        result.unwrap();
    }
    mutations.await.unwrap();
    assert_eq!(realm.chain_len(), 2);
}
