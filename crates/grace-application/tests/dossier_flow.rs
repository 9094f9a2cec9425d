//! Dossier CRUD against the in-memory store.

use std::sync::Arc;

use grace_application::DossierService;
use grace_core::ErrorKind;
use grace_core::dossier::{DossierPatch, DossierStatus, DossierType, NewDossier};
use grace_core::error::GraceError;
use grace_infrastructure::InMemoryDocumentStore;

fn service() -> (Arc<InMemoryDocumentStore>, DossierService) {
    let store = Arc::new(InMemoryDocumentStore::new());
    (store.clone(), DossierService::new(store))
}

#[tokio::test]
async fn test_create_sets_defaults() {
    let (_, service) = service();
    let dossier = service
        .create(
            "U1",
            NewDossier::new("Sinistre auto", DossierType::Auto).with_description("Choc arrière"),
        )
        .await
        .unwrap();

    let digits = dossier.id.strip_prefix("DOS-").unwrap();
    assert!(!digits.is_empty());
    assert!(digits.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(dossier.user_id, "U1");
    assert_eq!(dossier.status, DossierStatus::EnCours);
    assert_eq!(dossier.status.as_str(), "En cours");
    assert_eq!(dossier.documents_count, 0);
    assert_eq!(dossier.created_at, dossier.updated_at);
}

#[tokio::test]
async fn test_create_then_get() {
    let (_, service) = service();
    let created = service
        .create_for_type("U1", DossierType::Sante)
        .await
        .unwrap();
    assert_eq!(created.title, "Dossier d'Assurance Santé");

    let fetched = service.get("U1", &created.id).await.unwrap();
    assert_eq!(fetched, created);

    // Records are scoped to their owner.
    let err = service.get("U2", &created.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_most_recent_first() {
    let (_, service) = service();
    let mut ids = Vec::new();
    for dossier_type in [DossierType::Auto, DossierType::Habitation, DossierType::Vie] {
        ids.push(service.create_for_type("U1", dossier_type).await.unwrap().id);
    }
    service.create_for_type("U2", DossierType::Pro).await.unwrap();

    let listed = service.list("U1").await.unwrap();
    let listed_ids: Vec<&str> = listed.iter().map(|d| d.id.as_str()).collect();
    ids.reverse();
    assert_eq!(listed_ids, ids);
    assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn test_rapid_creates_have_distinct_ids() {
    let (store, service) = service();
    for _ in 0..20 {
        service.create_for_type("U1", DossierType::Auto).await.unwrap();
    }
    assert_eq!(store.dossier_count("U1").await, 20);
}

#[tokio::test]
async fn test_independent_services_share_id_sequence() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let first = DossierService::new(store.clone());
    let second = DossierService::new(store.clone());
    for _ in 0..100 {
        first.create_for_type("U1", DossierType::Auto).await.unwrap();
        second.create_for_type("U1", DossierType::Vie).await.unwrap();
    }
    assert_eq!(store.dossier_count("U1").await, 200);
}

#[tokio::test]
async fn test_update_status_bumps_updated_at() {
    let (_, service) = service();
    let created = service
        .create_for_type("U1", DossierType::Voyage)
        .await
        .unwrap();

    service
        .update("U1", &created.id, &DossierPatch::status("Validé"))
        .await
        .unwrap();

    let updated = service.get("U1", &created.id).await.unwrap();
    assert_eq!(updated.status, DossierStatus::Valide);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.title, created.title);
}

#[tokio::test]
async fn test_update_keeps_unrecognized_status() {
    let (_, service) = service();
    let created = service.create_for_type("U1", DossierType::Auto).await.unwrap();
    service
        .update("U1", &created.id, &DossierPatch::status("Refusé"))
        .await
        .unwrap();
    let updated = service.get("U1", &created.id).await.unwrap();
    assert_eq!(updated.status.as_str(), "Refusé");
    assert!(!updated.status.is_recognized());
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let (_, service) = service();
    let err = service
        .update("U1", "DOS-404", &DossierPatch::status("Validé"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_then_get() {
    let (_, service) = service();
    let created = service.create_for_type("U1", DossierType::Auto).await.unwrap();
    service.delete("U1", &created.id).await.unwrap();

    let err = service.get("U1", &created.id).await.unwrap_err();
    assert_eq!(err, GraceError::not_found("dossier", &created.id));

    // Deleting again is not an error.
    service.delete("U1", &created.id).await.unwrap();
}

#[tokio::test]
async fn test_store_failure_is_propagated() {
    let (store, service) = service();
    store.fail_next(GraceError::NetworkUnavailable);
    let err = service.list("U1").await.unwrap_err();
    assert_eq!(err, GraceError::NetworkUnavailable);
}
