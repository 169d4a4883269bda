//! End-to-end import runs against an in-memory realm.

use crate::common::{REALM, client, idp, init_logging, seed, user, users_bundle};
use realm_import::resource::{PartialImport, ResourceKind, UserRepresentation};
use realm_import::storage::InMemoryStorage;
use realm_import::{
    ConflictReason, ImportConfig, ImportCoordinator, ImportError, ImportOutcome, RealmStore,
    Resolution,
};

fn coordinator() -> ImportCoordinator<InMemoryStorage> {
    init_logging();
    ImportCoordinator::new(InMemoryStorage::new())
}

#[tokio::test]
async fn test_existing_client_rejects_whole_bundle() {
    let coordinator = coordinator();
    seed(&coordinator, PartialImport::new().with_client(client("foo"))).await;
    let before = coordinator.storage().realm_snapshot(REALM).await;

    let bundle = PartialImport::new()
        .with_client(client("foo"))
        .with_client(client("bar"));
    let outcome = coordinator.import_bundle(REALM, bundle).await;

    let rejection = match outcome {
        ImportOutcome::Rejected(rejection) => rejection,
        other => panic!("expected rejection, got {:?}", other),
    };
    assert_eq!(rejection.conflicts.len(), 1);
    assert_eq!(rejection.conflicts[0].kind, ResourceKind::Client);
    assert_eq!(rejection.conflicts[0].key.as_deref(), Some("foo"));
    assert_eq!(rejection.reason, "Client id 'foo' already exists");

    // bar was valid on its own but must not have been created
    let store = RealmStore::new(coordinator.storage(), REALM);
    assert!(!store.exists(ResourceKind::Client, "bar").await.unwrap());
    assert_eq!(coordinator.storage().realm_snapshot(REALM).await, before);
}

#[tokio::test]
async fn test_existing_client_is_overwritten_with_overwrite() {
    let coordinator = coordinator();
    seed(&coordinator, PartialImport::new().with_client(client("foo"))).await;

    let bundle = PartialImport::new()
        .with_overwrite(true)
        .with_client(client("foo"))
        .with_client(client("bar"));
    let outcome = coordinator.import_bundle(REALM, bundle).await;

    let summary = outcome.summary().expect("applied");
    assert_eq!(summary.overwritten(ResourceKind::Client), ["foo".to_string()]);
    assert_eq!(summary.created(ResourceKind::Client), ["bar".to_string()]);
    assert_eq!(summary.total(), 2);

    let store = RealmStore::new(coordinator.storage(), REALM);
    assert_eq!(
        store.keys(ResourceKind::Client).await.unwrap(),
        vec!["bar".to_string(), "foo".to_string()]
    );
}

#[tokio::test]
async fn test_rejection_reports_every_conflict() {
    let coordinator = coordinator();
    seed(
        &coordinator,
        PartialImport::new()
            .with_client(client("portal"))
            .with_identity_provider(idp("github"))
            .with_user(user("alice"))
            .with_user(user("bob")),
    )
    .await;

    let bundle = PartialImport::new()
        .with_client(client("portal"))
        .with_client(client("billing"))
        .with_identity_provider(idp("github"))
        .with_user(user("carol"))
        .with_user(user("alice"))
        .with_user(user("bob"));
    let outcome = coordinator.import_bundle(REALM, bundle).await;

    let rejection = outcome.rejection().expect("rejected");
    let keys: Vec<_> = rejection
        .conflicts
        .iter()
        .map(|c| (c.kind, c.key.clone().unwrap_or_default()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (ResourceKind::Client, "portal".to_string()),
            (ResourceKind::IdentityProvider, "github".to_string()),
            (ResourceKind::User, "alice".to_string()),
            (ResourceKind::User, "bob".to_string()),
        ]
    );
    assert_eq!(
        rejection.conflicts[1].message(),
        "Identity Provider 'github' already exists."
    );
    assert_eq!(outcome.http_status(), 409);
}

#[tokio::test]
async fn test_duplicate_in_bundle_blocks_even_with_overwrite() {
    let coordinator = coordinator();

    for overwrite in [false, true] {
        let bundle = users_bundle(["dave", "erin", "dave"], overwrite);
        let outcome = coordinator.import_bundle(REALM, bundle).await;

        let rejection = outcome.rejection().expect("rejected");
        assert_eq!(rejection.conflicts.len(), 1);
        assert_eq!(rejection.conflicts[0].index, 2);
        assert_eq!(
            rejection.conflicts[0].resolution,
            Resolution::Conflict(ConflictReason::DuplicateInBundle { first_index: 0 })
        );
    }

    assert!(coordinator.storage().realm_snapshot(REALM).await.is_empty());
}

#[tokio::test]
async fn test_item_without_key_blocks() {
    let coordinator = coordinator();
    let bundle = PartialImport::new()
        .with_overwrite(true)
        .with_user(user("alice"))
        .with_user(UserRepresentation::default());

    let outcome = coordinator.import_bundle(REALM, bundle).await;

    let rejection = outcome.rejection().expect("rejected");
    assert!(matches!(
        rejection.conflicts[0].resolution,
        Resolution::Invalid(_)
    ));
    assert_eq!(rejection.conflicts[0].key, None);
    assert!(coordinator.storage().realm_snapshot(REALM).await.is_empty());
}

#[tokio::test]
async fn test_empty_bundle_applies_nothing() {
    let coordinator = coordinator();
    let revision = coordinator.storage().revision(REALM).await;

    for bundle in [PartialImport::new(), PartialImport::new().with_overwrite(true)] {
        let outcome = coordinator.import_bundle(REALM, bundle).await;
        let summary = outcome.summary().expect("applied");
        assert!(summary.is_empty());
        assert_eq!(outcome.response_body()["added"], 0);
    }

    // commit of an empty transaction still flushes
    assert_eq!(coordinator.storage().revision(REALM).await, revision + 2);
    assert!(coordinator.storage().realm_snapshot(REALM).await.is_empty());
}

#[tokio::test]
async fn test_usernames_are_matched_case_insensitively() {
    let coordinator = coordinator();
    seed(&coordinator, users_bundle(["Alice"], false)).await;

    let outcome = coordinator
        .import_bundle(REALM, users_bundle(["ALICE"], false))
        .await;
    let rejection = outcome.rejection().expect("rejected");
    assert_eq!(rejection.conflicts[0].message(), "User 'alice' already exists");

    let store = RealmStore::new(coordinator.storage(), REALM);
    let stored = store.find(ResourceKind::User, "alice").await.unwrap().unwrap();
    assert_eq!(stored.data["username"], "alice");
}

#[tokio::test]
async fn test_mixed_case_username_stored_earlier_still_conflicts() {
    init_logging();
    let storage = InMemoryStorage::new();
    let case_sensitive = ImportCoordinator::builder(storage.clone())
        .with_config(ImportConfig::default().with_lowercase_usernames(false))
        .build()
        .unwrap();
    seed(&case_sensitive, users_bundle(["Alice"], false)).await;
    let before = storage.realm_snapshot(REALM).await;

    let coordinator = ImportCoordinator::new(storage.clone());
    let outcome = coordinator
        .import_bundle(REALM, users_bundle(["Alice"], false))
        .await;
    assert_eq!(outcome.http_status(), 409);
    let rejection = outcome.rejection().expect("rejected");
    assert_eq!(rejection.reason, "User 'alice' already exists");
    assert_eq!(storage.realm_snapshot(REALM).await, before);

    // overwriting replaces the stored user instead of adding a second one
    let outcome = coordinator
        .import_bundle(REALM, users_bundle(["Alice"], true))
        .await;
    let summary = outcome.summary().expect("applied");
    assert_eq!(summary.overwritten(ResourceKind::User), ["alice".to_string()]);

    let store = RealmStore::new(&storage, REALM);
    assert_eq!(
        store.keys(ResourceKind::User).await.unwrap(),
        vec!["alice".to_string()]
    );
}

#[tokio::test]
async fn test_internal_id_shared_within_bundle_is_rejected() {
    let coordinator = coordinator();

    let bundle = PartialImport::new()
        .with_client(client("a").with_id("x"))
        .with_client(client("b").with_id("x"));
    let outcome = coordinator.import_bundle(REALM, bundle).await;

    assert_eq!(outcome.http_status(), 409);
    let rejection = outcome.rejection().expect("rejected");
    assert_eq!(rejection.conflicts.len(), 1);
    assert_eq!(rejection.conflicts[0].key.as_deref(), Some("b"));
    assert_eq!(
        rejection.conflicts[0].resolution,
        Resolution::Conflict(ConflictReason::IdTaken {
            id: "x".to_string(),
            first_index: Some(0),
        })
    );
    assert!(coordinator.storage().realm_snapshot(REALM).await.is_empty());
}

#[tokio::test]
async fn test_internal_id_held_by_other_resource_is_rejected() {
    let coordinator = coordinator();
    seed(
        &coordinator,
        PartialImport::new().with_user(user("alice").with_id("u1")),
    )
    .await;
    let before = coordinator.storage().realm_snapshot(REALM).await;

    for overwrite in [false, true] {
        let bundle = PartialImport::new()
            .with_overwrite(overwrite)
            .with_user(user("bob").with_id("u1"));
        let outcome = coordinator.import_bundle(REALM, bundle).await;

        assert_eq!(outcome.http_status(), 409);
        let rejection = outcome.rejection().expect("rejected");
        assert_eq!(
            rejection.reason,
            "User 'bob' uses id 'u1', which belongs to another User in the realm"
        );
        assert_eq!(outcome.response_body()["conflicts"][0]["key"], "bob");
    }
    assert_eq!(coordinator.storage().realm_snapshot(REALM).await, before);
}

#[tokio::test]
async fn test_overwritten_user_ignores_supplied_id() {
    let coordinator = coordinator();
    seed(
        &coordinator,
        PartialImport::new()
            .with_user(user("alice").with_id("u1"))
            .with_user(user("bob").with_id("u2")),
    )
    .await;

    // bob keeps u2 on overwrite, so naming u1 is not a claim on alice's id
    let bundle = PartialImport::new()
        .with_overwrite(true)
        .with_user(user("bob").with_id("u1"));
    let outcome = coordinator.import_bundle(REALM, bundle).await;
    assert!(outcome.is_applied());

    let store = RealmStore::new(coordinator.storage(), REALM);
    let bob = store.find(ResourceKind::User, "bob").await.unwrap().unwrap();
    assert_eq!(bob.id(), "u2");
}

#[tokio::test]
async fn test_case_sensitive_usernames_when_configured() {
    init_logging();
    let coordinator = ImportCoordinator::builder(InMemoryStorage::new())
        .with_config(ImportConfig::default().with_lowercase_usernames(false))
        .build()
        .unwrap();

    let outcome = coordinator
        .import_bundle(REALM, users_bundle(["Alice", "alice"], false))
        .await;
    let summary = outcome.summary().expect("applied");
    assert_eq!(
        summary.created(ResourceKind::User),
        ["Alice".to_string(), "alice".to_string()]
    );
}

#[tokio::test]
async fn test_identity_provider_overwrite_keeps_internal_id() {
    let coordinator = coordinator();
    seed(
        &coordinator,
        PartialImport::new().with_identity_provider(idp("github").with_config("clientId", "v1")),
    )
    .await;
    let store = RealmStore::new(coordinator.storage(), REALM);
    let before = store
        .find(ResourceKind::IdentityProvider, "github")
        .await
        .unwrap()
        .unwrap();

    let bundle = PartialImport::new()
        .with_overwrite(true)
        .with_identity_provider(idp("github").with_config("clientId", "v2"));
    let outcome = coordinator.import_bundle(REALM, bundle).await;
    assert!(outcome.is_applied());

    let after = store
        .find(ResourceKind::IdentityProvider, "github")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.id(), before.id());
    assert_eq!(after.data["config"]["clientId"], "v2");
}

#[tokio::test]
async fn test_oversized_bundle_is_rejected() {
    init_logging();
    let coordinator = ImportCoordinator::builder(InMemoryStorage::new())
        .with_config(ImportConfig::default().with_max_bundle_items(2))
        .build()
        .unwrap();

    let outcome = coordinator
        .import_bundle(REALM, users_bundle(["a", "b", "c"], false))
        .await;
    let rejection = outcome.rejection().expect("rejected");
    assert!(rejection.conflicts.is_empty());
    assert!(rejection.reason.contains("more than the allowed 2"));

    let outcome = coordinator
        .import_bundle(REALM, users_bundle(["a", "b"], false))
        .await;
    assert!(outcome.is_applied());
}

#[tokio::test]
async fn test_import_json() {
    let coordinator = coordinator();

    let outcome = coordinator
        .import_json(
            REALM,
            r#"{
                "overwrite": false,
                "clients": [{"clientId": "portal", "redirectUris": ["https://portal/*"]}],
                "identityProviders": [{"alias": "github", "providerId": "github"}],
                "users": [{"username": "alice", "enabled": true}]
            }"#,
        )
        .await
        .unwrap();
    assert!(outcome.is_applied());
    assert_eq!(outcome.summary().unwrap().total(), 3);

    let store = RealmStore::new(coordinator.storage(), REALM);
    let portal = store.find(ResourceKind::Client, "portal").await.unwrap().unwrap();
    assert_eq!(portal.data["redirectUris"][0], "https://portal/*");

    let result = coordinator.import_json(REALM, r#"{"users": "alice"}"#).await;
    assert!(matches!(result, Err(ImportError::Json(_))));
}

#[tokio::test]
async fn test_preview_does_not_write() {
    let coordinator = coordinator();
    seed(&coordinator, users_bundle(["alice"], false)).await;
    let before = coordinator.storage().realm_snapshot(REALM).await;

    let report = coordinator
        .preview(REALM, &users_bundle(["alice", "bob"], true))
        .await
        .unwrap();

    assert!(!report.is_blocked());
    assert_eq!(report.overwrites(), 1);
    assert_eq!(report.creates(), 1);
    assert_eq!(coordinator.storage().realm_snapshot(REALM).await, before);
}

#[tokio::test]
async fn test_realms_are_isolated() {
    let coordinator = coordinator();
    seed(&coordinator, users_bundle(["alice"], false)).await;

    let outcome = coordinator
        .import_bundle("other", users_bundle(["alice"], false))
        .await;
    assert!(outcome.is_applied());
}
