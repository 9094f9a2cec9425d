//! In-memory document store.
//!
//! Directory-like layout mirroring the managed store:
//! ```text
//! users/
//! └── {uid}                  # UserProfile
//!     └── dossiers/
//!         └── {dossier_id}   # Dossier
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grace_core::dossier::{Dossier, DossierPatch, DossierRepository};
use grace_core::error::{GraceError, Result};
use grace_core::user::{ProfileRepository, ProfileUpdate, UserProfile};
use tokio::sync::RwLock;

/// Document store keeping profiles and dossiers in process memory.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    dossiers: RwLock<HashMap<String, BTreeMap<String, Dossier>>>,
    /// Error returned by the next operation instead of running it.
    next_failure: Mutex<Option<GraceError>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store operation fail with `error`.
    pub fn fail_next(&self, error: GraceError) {
        *self
            .next_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error);
    }

    pub async fn dossier_count(&self, user_id: &str) -> usize {
        let dossiers = self.dossiers.read().await;
        dossiers.get(user_id).map_or(0, BTreeMap::len)
    }

    fn take_failure(&self) -> Result<()> {
        let failure = self
            .next_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryDocumentStore {
    async fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.take_failure()?;
        let profiles = self.profiles.read().await;
        Ok(profiles.get(uid).cloned())
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        self.take_failure()?;
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn update(
        &self,
        uid: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        self.take_failure()?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| GraceError::not_found("profile", uid))?;
        update.apply_to(profile, updated_at);
        Ok(())
    }
}

#[async_trait]
impl DossierRepository for InMemoryDocumentStore {
    async fn create(&self, dossier: &Dossier) -> Result<()> {
        self.take_failure()?;
        let mut dossiers = self.dossiers.write().await;
        let collection = dossiers.entry(dossier.user_id.clone()).or_default();
        if collection.contains_key(&dossier.id) {
            return Err(GraceError::already_exists("dossier", &dossier.id));
        }
        collection.insert(dossier.id.clone(), dossier.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &str, dossier_id: &str) -> Result<Option<Dossier>> {
        self.take_failure()?;
        let dossiers = self.dossiers.read().await;
        Ok(dossiers
            .get(user_id)
            .and_then(|collection| collection.get(dossier_id))
            .cloned())
    }

    async fn list_by_created_desc(&self, user_id: &str) -> Result<Vec<Dossier>> {
        self.take_failure()?;
        let dossiers = self.dossiers.read().await;
        let mut list: Vec<Dossier> = dossiers
            .get(user_id)
            .map(|collection| collection.values().cloned().collect())
            .unwrap_or_default();

        // Sort by created_at descending (most recent first)
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update(
        &self,
        user_id: &str,
        dossier_id: &str,
        patch: &DossierPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        self.take_failure()?;
        let mut dossiers = self.dossiers.write().await;
        let dossier = dossiers
            .get_mut(user_id)
            .and_then(|collection| collection.get_mut(dossier_id))
            .ok_or_else(|| GraceError::not_found("dossier", dossier_id))?;
        patch.apply_to(dossier, updated_at);
        Ok(())
    }

    async fn delete(&self, user_id: &str, dossier_id: &str) -> Result<()> {
        self.take_failure()?;
        let mut dossiers = self.dossiers.write().await;
        if let Some(collection) = dossiers.get_mut(user_id) {
            collection.remove(dossier_id);
        }
        Ok(())
    }
}
