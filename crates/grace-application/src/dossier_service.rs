//! Dossier use case.
//!
//! Every record lives under the owning user (`users/{user_id}/dossiers/{id}`);
//! the service stamps ids and timestamps and leaves persistence to the
//! [`DossierRepository`].

use std::sync::Arc;

use grace_core::config::{DossierConfig, IdStrategy};
use grace_core::dossier::{
    Clock, Dossier, DossierIdGenerator, DossierPatch, DossierRepository, DossierStatus,
    DossierType, NewDossier, SystemClock, TimestampIdGenerator, UuidIdGenerator,
};
use grace_core::error::{GraceError, Result};

pub struct DossierService {
    repository: Arc<dyn DossierRepository>,
    id_generator: Arc<dyn DossierIdGenerator>,
    clock: Arc<dyn Clock>,
}

impl DossierService {
    /// Service using timestamp ids and the system clock.
    pub fn new(repository: Arc<dyn DossierRepository>) -> Self {
        Self::from_config(repository, &DossierConfig::default())
    }

    pub fn from_config(repository: Arc<dyn DossierRepository>, config: &DossierConfig) -> Self {
        let id_generator: Arc<dyn DossierIdGenerator> = match config.id_strategy {
            IdStrategy::Timestamp => Arc::new(TimestampIdGenerator::new()),
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
        };
        Self {
            repository,
            id_generator,
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn DossierIdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates a dossier with status "En cours" and no documents.
    ///
    /// An id collision fails with [`GraceError::AlreadyExists`].
    pub async fn create(&self, user_id: &str, new: NewDossier) -> Result<Dossier> {
        let now = self.clock.now();
        let dossier = Dossier {
            id: self.id_generator.next_id(),
            user_id: user_id.to_string(),
            title: new.title,
            dossier_type: new.dossier_type,
            status: DossierStatus::EnCours,
            description: new.description,
            created_at: now,
            updated_at: now,
            documents_count: 0,
        };

        self.repository.create(&dossier).await?;
        tracing::info!("[Dossier] Created {} for user {}", dossier.id, user_id);
        Ok(dossier)
    }

    /// Creates the canonical dossier for `dossier_type`.
    pub async fn create_for_type(&self, user_id: &str, dossier_type: DossierType) -> Result<Dossier> {
        self.create(user_id, NewDossier::for_type(dossier_type)).await
    }

    /// Dossiers of `user_id`, most recent first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Dossier>> {
        let dossiers = self.repository.list_by_created_desc(user_id).await?;
        tracing::debug!("[Dossier] Listed {} dossiers for user {}", dossiers.len(), user_id);
        Ok(dossiers)
    }

    pub async fn get(&self, user_id: &str, dossier_id: &str) -> Result<Dossier> {
        self.repository
            .find_by_id(user_id, dossier_id)
            .await?
            .ok_or_else(|| GraceError::not_found("dossier", dossier_id))
    }

    /// Merges `patch` into an existing dossier and stamps `updated_at`.
    ///
    /// Field values are stored as given.
    pub async fn update(&self, user_id: &str, dossier_id: &str, patch: &DossierPatch) -> Result<()> {
        self.repository
            .update(user_id, dossier_id, patch, self.clock.now())
            .await?;
        tracing::info!("[Dossier] Updated {}", dossier_id);
        Ok(())
    }

    /// Deletes without an existence check.
    pub async fn delete(&self, user_id: &str, dossier_id: &str) -> Result<()> {
        self.repository.delete(user_id, dossier_id).await?;
        tracing::info!("[Dossier] Deleted {}", dossier_id);
        Ok(())
    }

    /// Dossier counts per status, over [`Self::list`].
    pub async fn count_by_status(&self, user_id: &str) -> Result<Vec<(DossierStatus, usize)>> {
        let dossiers = self.list(user_id).await?;
        Ok(Self::tally_statuses(&dossiers))
    }

    /// Known statuses come first in their fixed order (zero counts
    /// included), followed by unrecognized ones in order of appearance.
    pub fn tally_statuses(dossiers: &[Dossier]) -> Vec<(DossierStatus, usize)> {
        let mut counts: Vec<(DossierStatus, usize)> = DossierStatus::KNOWN
            .iter()
            .map(|status| (status.clone(), 0))
            .collect();

        for dossier in dossiers {
            match counts.iter_mut().find(|(status, _)| *status == dossier.status) {
                Some((_, count)) => *count += 1,
                None => counts.push((dossier.status.clone(), 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::dossier::DOSSIER_ID_PREFIX;
    use grace_infrastructure::InMemoryDocumentStore;

    struct FixedIds;

    impl DossierIdGenerator for FixedIds {
        fn next_id(&self) -> String {
            "DOS-1".to_string()
        }
    }

    #[tokio::test]
    async fn test_uuid_strategy() {
        let config = DossierConfig {
            id_strategy: IdStrategy::Uuid,
        };
        let service = DossierService::from_config(Arc::new(InMemoryDocumentStore::new()), &config);
        let dossier = service
            .create("u1", NewDossier::new("Habitation", DossierType::Habitation))
            .await
            .unwrap();
        let suffix = dossier.id.strip_prefix(DOSSIER_ID_PREFIX).unwrap();
        assert_eq!(suffix.len(), 32);
    }

    #[tokio::test]
    async fn test_id_collision_is_conflict() {
        let service = DossierService::new(Arc::new(InMemoryDocumentStore::new()))
            .with_id_generator(Arc::new(FixedIds));
        service
            .create_for_type("u1", DossierType::Auto)
            .await
            .unwrap();
        let err = service
            .create_for_type("u1", DossierType::Sante)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), grace_core::ErrorKind::Conflict);

        // The first record is untouched.
        let kept = service.get("u1", "DOS-1").await.unwrap();
        assert_eq!(kept.dossier_type, DossierType::Auto);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let service = DossierService::new(Arc::new(InMemoryDocumentStore::new()));
        let a = service.create_for_type("u1", DossierType::Auto).await.unwrap();
        let b = service.create_for_type("u1", DossierType::Vie).await.unwrap();
        service.create_for_type("u1", DossierType::Voyage).await.unwrap();
        service
            .update("u1", &a.id, &DossierPatch::status("Validé"))
            .await
            .unwrap();
        service
            .update("u1", &b.id, &DossierPatch::status("Archivé"))
            .await
            .unwrap();

        let counts = service.count_by_status("u1").await.unwrap();
        assert_eq!(
            counts,
            vec![
                (DossierStatus::EnCours, 1),
                (DossierStatus::Termine, 0),
                (DossierStatus::Valide, 1),
                (DossierStatus::EnAttente, 0),
                (DossierStatus::Unrecognized("Archivé".to_string()), 1),
            ]
        );
    }
}
