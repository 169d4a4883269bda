//! Runs racing on the same realm are serialized by the coordinator.

use crate::common::{REALM, init_logging, users_bundle};
use futures::future::join_all;
use realm_import::resource::ResourceKind;
use realm_import::storage::InMemoryStorage;
use realm_import::{ImportCoordinator, RealmStore};
use std::sync::Arc;

#[tokio::test]
async fn test_same_key_races_create_once() {
    init_logging();
    let coordinator = ImportCoordinator::new(InMemoryStorage::new());

    let runs = (0..8).map(|_| coordinator.import_bundle(REALM, users_bundle(["alice"], false)));
    let outcomes = join_all(runs).await;

    assert_eq!(outcomes.iter().filter(|o| o.is_applied()).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_rejected()).count(), 7);

    let store = RealmStore::new(coordinator.storage(), REALM);
    assert_eq!(store.list(ResourceKind::User).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_overlapping_overwrites_leave_one_resource_per_key() {
    init_logging();
    let coordinator = ImportCoordinator::new(InMemoryStorage::new());

    let runs =
        (0..4).map(|_| coordinator.import_bundle(REALM, users_bundle(["alice", "bob"], true)));
    let outcomes = join_all(runs).await;
    assert!(outcomes.iter().all(|o| o.is_applied()));

    let store = RealmStore::new(coordinator.storage(), REALM);
    assert_eq!(
        store.keys(ResourceKind::User).await.unwrap(),
        vec!["alice".to_string(), "bob".to_string()]
    );
}

#[tokio::test]
async fn test_spawned_runs_on_different_realms() {
    init_logging();
    let coordinator = Arc::new(ImportCoordinator::new(InMemoryStorage::new()));

    let handles: Vec<_> = ["north", "south", "east"]
        .into_iter()
        .map(|realm| {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .import_bundle(realm, users_bundle(["alice"], false))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_applied());
    }
    assert_eq!(coordinator.storage().stats().await.realm_count, 3);
}
