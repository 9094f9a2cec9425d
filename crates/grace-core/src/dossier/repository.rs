//! Dossier repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Dossier, DossierPatch};
use crate::error::Result;

/// An abstract repository for the per-user dossier sub-collection.
///
/// Every operation is scoped by `user_id`; a dossier is never addressed
/// globally. Implementations convert backend failures into
/// [`crate::error::GraceError`] values.
#[async_trait]
pub trait DossierRepository: Send + Sync {
    /// Writes a new dossier.
    ///
    /// Create-only: fails with `AlreadyExists` when a record with the same
    /// id exists under `dossier.user_id`.
    async fn create(&self, dossier: &Dossier) -> Result<()>;

    /// Finds a dossier by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Dossier))`: Dossier found
    /// - `Ok(None)`: No record at that path
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, user_id: &str, dossier_id: &str) -> Result<Option<Dossier>>;

    /// Lists all dossiers of a user, most recently created first.
    async fn list_by_created_desc(&self, user_id: &str) -> Result<Vec<Dossier>>;

    /// Merges `patch` into an existing record and sets `updated_at`.
    ///
    /// Fails with `NotFound` if the record does not exist.
    async fn update(
        &self,
        user_id: &str,
        dossier_id: &str,
        patch: &DossierPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Deletes a dossier. Deleting a missing record succeeds.
    async fn delete(&self, user_id: &str, dossier_id: &str) -> Result<()>;
}
