//! Identity provider port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Result;

/// Identity as known by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Authentication state pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderAuthState {
    /// The provider has not restored or rejected a persisted session yet.
    #[default]
    Unresolved,
    SignedOut,
    SignedIn(AuthUser),
}

impl ProviderAuthState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// External service owning credentials and authentication sessions.
///
/// Every method maps provider failures through
/// [`super::map_provider_code`] so callers only see
/// [`crate::error::GraceError`] values.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and signs it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;

    /// Asks the provider to email a password reset link.
    async fn send_password_reset(&self, email: &str) -> Result<()>;

    /// Sets the display name of the signed-in account `uid`.
    ///
    /// Does not push a new auth state.
    async fn update_display_name(&self, uid: &str, display_name: &str) -> Result<()>;

    /// The currently signed-in account, if any.
    fn current_user(&self) -> Option<AuthUser>;

    /// Stream of auth state changes. The receiver starts at the current state.
    fn auth_state(&self) -> watch::Receiver<ProviderAuthState>;
}
