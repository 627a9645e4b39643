//! Realm resolution backed by PostgreSQL mapping tables.

use std::sync::Arc;

use us_model::{Claims, Credential, EntityKind};
use us_storage::UserStoreManager;

use crate::common::{domain, realm, realm_config, PostgresEnv, TENANT};

#[tokio::test]
#[ignore = "requires Docker"]
async fn mappings_outlive_the_cache() {
    let pg = PostgresEnv::new().await.unwrap();
    let resolvers = pg.resolvers();
    let realm = realm(realm_config(&["ldap"]), &resolvers).await;

    let ldap = realm.user_store_for_domain(&domain("LDAP")).unwrap();
    let user = ldap
        .add_user("gus", &Credential::new("pw"), &[], &Claims::new(), None)
        .await
        .unwrap();
    realm.store_for_user_id(&user.user_id).await.unwrap().unwrap();

    // A restart empties the cache; the table still knows the owner.
    resolvers.users.clear_cache(TENANT).await;
    assert_eq!(
        resolvers.users.get_domain(&user.user_id, TENANT).await.unwrap(),
        Some(domain("LDAP"))
    );
    assert_eq!(resolvers.users.kind(), EntityKind::User);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_first_resolutions_store_one_row() {
    let pg = PostgresEnv::new().await.unwrap();
    let resolvers = Arc::new(pg.resolvers());

    let writes = (0..32).map(|i| {
        let resolvers = Arc::clone(&resolvers);
        let target = if i % 2 == 0 { "LDAP" } else { "JDBC" };
        tokio::spawn(async move { resolvers.users.set_domain("shared", target, TENANT, false).await })
    });
    for result in futures::future::join_all(writes).await {
        result.unwrap().unwrap();
    }

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM um_uuid_domain_mapper WHERE um_user_id = $1 AND um_tenant_id = $2",
    )
    .bind("shared")
    .bind(TENANT.get())
    .fetch_one(&pg.pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);
}
