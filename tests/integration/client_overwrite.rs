//! Client overwrite: the client is rebuilt with its roles and every user
//! mapping that referenced it is dropped.

use crate::common::{REALM, client, init_logging, seed, user};
use realm_import::resource::{PartialImport, ResourceKind};
use realm_import::storage::InMemoryStorage;
use realm_import::strategy::client::CLIENT_ROLE_TYPE;
use realm_import::{ImportCoordinator, RealmStore};

async fn role_names(
    coordinator: &ImportCoordinator<InMemoryStorage>,
    container: &str,
) -> Vec<String> {
    let store = RealmStore::new(coordinator.storage(), REALM);
    let mut names: Vec<String> = store
        .find_documents(CLIENT_ROLE_TYPE, "containerId", container)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|(_, role)| role["name"].as_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_overwrite_rebuilds_roles_and_drops_mappings() {
    init_logging();
    let coordinator = ImportCoordinator::new(InMemoryStorage::new());
    seed(
        &coordinator,
        PartialImport::new()
            .with_client(client("portal").with_default_roles(["viewer", "auditor"]))
            .with_client(client("billing").with_default_roles(["payer"]))
            .with_user(
                user("alice")
                    .with_client_roles("portal", ["viewer"])
                    .with_client_roles("billing", ["payer"]),
            )
            .with_user(user("bob").with_client_roles("portal", ["auditor"])),
    )
    .await;

    let store = RealmStore::new(coordinator.storage(), REALM);
    let portal = store.find(ResourceKind::Client, "portal").await.unwrap().unwrap();
    let billing = store.find(ResourceKind::Client, "billing").await.unwrap().unwrap();

    let bundle = PartialImport::new()
        .with_overwrite(true)
        .with_client(client("portal").with_default_roles(["viewer", "editor"]));
    let outcome = coordinator.import_bundle(REALM, bundle).await;
    assert!(outcome.is_applied());

    let rebuilt = store.find(ResourceKind::Client, "portal").await.unwrap().unwrap();
    assert_eq!(rebuilt.id(), portal.id());
    assert_eq!(
        role_names(&coordinator, portal.id()).await,
        vec!["editor".to_string(), "viewer".to_string()]
    );
    assert_eq!(role_names(&coordinator, billing.id()).await, vec!["payer".to_string()]);

    let alice = store.find(ResourceKind::User, "alice").await.unwrap().unwrap();
    assert!(alice.data["clientRoles"].get("portal").is_none());
    assert_eq!(alice.data["clientRoles"]["billing"][0], "payer");

    let bob = store.find(ResourceKind::User, "bob").await.unwrap().unwrap();
    assert!(bob.data.get("clientRoles").is_none());
}

#[tokio::test]
async fn test_users_in_same_bundle_can_map_the_rebuilt_client() {
    init_logging();
    let coordinator = ImportCoordinator::new(InMemoryStorage::new());
    seed(
        &coordinator,
        PartialImport::new()
            .with_client(client("portal").with_default_roles(["viewer"]))
            .with_user(user("alice").with_client_roles("portal", ["viewer"])),
    )
    .await;

    let bundle = PartialImport::new()
        .with_overwrite(true)
        .with_client(client("portal").with_default_roles(["viewer"]))
        .with_user(user("alice").with_client_roles("portal", ["viewer"]));
    let outcome = coordinator.import_bundle(REALM, bundle).await;

    let summary = outcome.summary().expect("applied");
    assert_eq!(summary.overwritten(ResourceKind::Client), ["portal".to_string()]);
    assert_eq!(summary.overwritten(ResourceKind::User), ["alice".to_string()]);

    let store = RealmStore::new(coordinator.storage(), REALM);
    let alice = store.find(ResourceKind::User, "alice").await.unwrap().unwrap();
    assert_eq!(alice.data["clientRoles"]["portal"][0], "viewer");
}

#[tokio::test]
async fn test_overwrite_replay_is_idempotent() {
    init_logging();
    let coordinator = ImportCoordinator::new(InMemoryStorage::new());
    seed(
        &coordinator,
        PartialImport::new()
            .with_client(client("portal").with_default_roles(["legacy"]))
            .with_user(user("zoe").with_client_roles("portal", ["legacy"])),
    )
    .await;

    let bundle = PartialImport::new()
        .with_overwrite(true)
        .with_client(client("portal").with_default_roles(["viewer", "editor"]))
        .with_client(client("billing"))
        .with_user(user("alice").with_client_roles("portal", ["viewer"]));

    assert!(coordinator.import_bundle(REALM, bundle.clone()).await.is_applied());
    let once = coordinator.storage().realm_snapshot(REALM).await;

    assert!(coordinator.import_bundle(REALM, bundle).await.is_applied());
    let twice = coordinator.storage().realm_snapshot(REALM).await;

    assert_eq!(once, twice);
}
