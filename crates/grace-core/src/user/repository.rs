//! Profile repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{ProfileUpdate, UserProfile};
use crate::error::Result;

/// Access to the per-user profile record (`users/{uid}`).
///
/// Implementations convert every backend failure into a
/// [`crate::error::GraceError`] before returning.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds the profile of a user.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UserProfile))`: Profile found
    /// - `Ok(None)`: No profile record for this user
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>>;

    /// Writes the whole profile, creating or replacing it.
    async fn save(&self, profile: &UserProfile) -> Result<()>;

    /// Merges `update` into the existing profile and sets `updated_at`.
    ///
    /// Fails with `NotFound` if no profile exists.
    async fn update(
        &self,
        uid: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
}
