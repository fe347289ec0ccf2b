//! End-to-end registry operation tests.

use passport_registry::{
    DuplicateField, PassportRecord, RegistryError, RegistryEvent, RegistryStore,
};
use std::sync::Arc;

const OWNER: &str = "owner";
const ISSUER: &str = "A";

async fn store() -> Arc<RegistryStore> {
    let store = RegistryStore::in_memory(OWNER).await.unwrap();
    store.authorize_issuer(OWNER, ISSUER).await.unwrap();
    store
}

async fn snapshot_all(store: &RegistryStore) -> Vec<PassportRecord> {
    let mut records = Vec::new();
    for id in 1..=store.count().await {
        records.push(store.get(id).await.unwrap());
    }
    records
}

#[tokio::test]
async fn first_registration_gets_id_one_and_verifies() {
    let store = store().await;

    let id = store
        .register(ISSUER, "cid1", "h1", "P1", "sup")
        .await
        .unwrap();
    assert_eq!(id, 1);

    let v = store.verify_by_hash("h1").await;
    assert!(v.valid);
    assert_eq!(v.id, Some(1));
    assert_eq!(v.locator.as_deref(), Some("cid1"));
}

#[tokio::test]
async fn duplicate_locator_is_rejected_without_side_effects() {
    let store = store().await;
    store
        .register(ISSUER, "cid1", "h1", "P1", "sup")
        .await
        .unwrap();
    let before = snapshot_all(&store).await;

    let err = store
        .register(ISSUER, "cid1", "h2", "P2", "sup")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Duplicate {
            field: DuplicateField::Locator,
            ..
        }
    ));

    assert_eq!(store.count().await, 1);
    assert_eq!(snapshot_all(&store).await, before);
    // The failed attempt consumed no id
    assert_eq!(
        store
            .register(ISSUER, "cid2", "h2", "P2", "sup")
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn update_moves_verification_to_new_keys() {
    let store = store().await;
    store
        .register(ISSUER, "cid1", "h1", "P1", "sup")
        .await
        .unwrap();

    store.update(ISSUER, 1, "cid2", "h2").await.unwrap();

    let old = store.verify_by_hash("h1").await;
    assert!(!old.valid);
    assert_eq!(old.id, None);
    assert_eq!(old.locator, None);

    let new = store.verify_by_hash("h2").await;
    assert!(new.valid);
    assert_eq!(new.id, Some(1));
    assert_eq!(new.locator.as_deref(), Some("cid2"));
}

#[tokio::test]
async fn deactivated_passport_fails_verification_but_keeps_diagnostics() {
    let store = store().await;
    store
        .register(ISSUER, "cid1", "h1", "P1", "sup")
        .await
        .unwrap();
    store.update(ISSUER, 1, "cid2", "h2").await.unwrap();
    store.deactivate(ISSUER, 1).await.unwrap();

    let v = store.verify_by_hash("h2").await;
    assert!(!v.valid);
    assert_eq!(v.id, Some(1));
    assert_eq!(v.locator.as_deref(), Some("cid2"));
}

#[tokio::test]
async fn deactivation_does_not_release_keys() {
    let store = store().await;
    store
        .register(ISSUER, "cid2", "h2", "P1", "sup")
        .await
        .unwrap();
    store.deactivate(ISSUER, 1).await.unwrap();

    let err = store
        .register(ISSUER, "cid2", "h3", "P3", "sup")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Duplicate {
            field: DuplicateField::Locator,
            ..
        }
    ));
}

#[tokio::test]
async fn only_the_owner_manages_issuers() {
    let store = store().await;

    let err = store.authorize_issuer("notOwner", "B").await.unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized(_)));
    assert!(!store.is_authorized("B").await);

    store.authorize_issuer(OWNER, "B").await.unwrap();
    assert!(store.is_authorized("B").await);
}

#[tokio::test]
async fn failed_update_leaves_state_unchanged() {
    let store = store().await;
    store
        .register(ISSUER, "cid1", "h1", "P1", "sup")
        .await
        .unwrap();
    store
        .register(ISSUER, "cid2", "h2", "P2", "sup")
        .await
        .unwrap();
    let before = snapshot_all(&store).await;

    // Locator collides with record 2; nothing may move
    let err = store.update(ISSUER, 1, "cid2", "h3").await.unwrap_err();
    assert!(matches!(err, RegistryError::Duplicate { .. }));

    assert_eq!(snapshot_all(&store).await, before);
    assert!(store.verify_by_hash("h1").await.valid);
    assert!(store.verify_by_hash("h2").await.valid);
    assert_eq!(store.verify_by_hash("h3").await.id, None);
}

#[tokio::test]
async fn lifecycle_emits_one_event_per_mutation() {
    let store = RegistryStore::in_memory(OWNER).await.unwrap();
    let mut events = store.subscribe();

    store.authorize_issuer(OWNER, ISSUER).await.unwrap();
    store
        .register(ISSUER, "cid1", "h1", "P1", "sup")
        .await
        .unwrap();
    // Failures in between emit nothing
    store
        .register(ISSUER, "cid1", "h9", "P9", "sup")
        .await
        .unwrap_err();
    store.update(ISSUER, 1, "cid2", "h2").await.unwrap();
    store.deactivate(OWNER, 1).await.unwrap();
    store.revoke_issuer(OWNER, ISSUER).await.unwrap();

    let expected = [
        RegistryEvent::IssuerAuthorized {
            principal: ISSUER.into(),
        },
        RegistryEvent::Registered {
            id: 1,
            locator: "cid1".into(),
            integrity_hash: "h1".into(),
            issuer: ISSUER.into(),
            product_id: "P1".into(),
        },
        RegistryEvent::Updated {
            id: 1,
            locator: "cid2".into(),
            integrity_hash: "h2".into(),
        },
        RegistryEvent::Deactivated { id: 1 },
        RegistryEvent::IssuerRevoked {
            principal: ISSUER.into(),
        },
    ];
    for expected in expected {
        assert_eq!(events.recv().await.unwrap(), expected);
    }
}

#[tokio::test]
async fn revoked_issuer_keeps_rights_over_own_passports() {
    let store = store().await;
    store
        .register(ISSUER, "cid1", "h1", "P1", "sup")
        .await
        .unwrap();
    store.revoke_issuer(OWNER, ISSUER).await.unwrap();

    // Can no longer register
    let err = store
        .register(ISSUER, "cid2", "h2", "P2", "sup")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized(_)));

    // But remains the recorded issuer of passport 1 and may still update it
    store.update(ISSUER, 1, "cid2", "h2").await.unwrap();
    assert_eq!(store.get(1).await.unwrap().issuer, ISSUER);
}

#[tokio::test]
async fn product_id_lookup() {
    let store = store().await;
    store
        .register(ISSUER, "cid1", "h1", "GTIN-00123", "sup")
        .await
        .unwrap();

    let record = store.get_by_product_id("GTIN-00123").await.unwrap();
    assert_eq!(record.id, 1);

    let err = store.get_by_product_id("GTIN-99999").await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[tokio::test]
async fn content_digest_feeds_registration() {
    let store = store().await;

    let document = serde_json::json!({
        "productName": "organic cotton shirt",
        "gtin": "00012345600012",
        "materialComposition": {"cotton": "100%"},
    });
    let hash = passport_registry::digest::content_digest(&document);

    let id = store
        .register(ISSUER, "bafy-cid-1", &hash, "00012345600012", "sup")
        .await
        .unwrap();

    // A verifier recomputes the digest from the fetched document
    let recomputed = passport_registry::digest::content_digest(&document);
    let v = store.verify_by_hash(&recomputed).await;
    assert!(v.valid);
    assert_eq!(v.id, Some(id));
}
