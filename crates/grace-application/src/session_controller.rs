//! Session use case.
//!
//! `SessionController` owns the authentication lifecycle: it talks to the
//! [`IdentityProvider`], reads and writes profile records through the
//! [`ProfileRepository`], and publishes the merged [`User`] through a
//! [`SessionStore`] that any number of consumers can observe.
//!
//! # State transitions
//!
//! ```text
//! Loading ──► Anonymous ◄──► Authenticated(user)
//!    └──────────────────────────►  │  ▲
//!                                  └──┘ profile refresh
//! ```
//!
//! Every transition goes through one async lock, so a provider event handled
//! by the listener task never interleaves with an explicit `login` or
//! `register` and overwrites its result.

use std::sync::{Arc, Mutex, Weak};

use grace_core::auth::{AuthUser, IdentityProvider, ProviderAuthState};
use grace_core::dossier::Clock;
use grace_core::error::{GraceError, Result};
use grace_core::session::{SessionState, SessionStore, Subscription};
use grace_core::user::{ProfileRepository, ProfileUpdate, Registration, User, UserProfile};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct SessionController {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
    store: Arc<SessionStore>,
    /// Serializes state transitions.
    transition: tokio::sync::Mutex<()>,
    /// Identity last merged into the session, used to skip redundant events.
    last_identity: Mutex<Option<AuthUser>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            identity,
            profiles,
            clock,
            store: SessionStore::new(),
            transition: tokio::sync::Mutex::new(()),
            last_identity: Mutex::new(None),
            listener: Mutex::new(None),
        })
    }

    /// Registers `callback` on the session store.
    ///
    /// See [`SessionStore::subscribe`] for the invocation contract.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.store.watch()
    }

    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.current_user()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let _guard = self.transition.lock().await;
        let auth = self.identity.sign_in(email, password).await?;
        let profile = self.profiles.find_by_id(&auth.uid).await?;
        let user = User::merge(&auth, profile.as_ref());
        self.apply(Some(auth), SessionState::Authenticated(user.clone()));
        tracing::info!("[Session] Logged in user {}", user.id);
        Ok(user)
    }

    /// Creates the account, sets its display name, then writes the profile.
    ///
    /// Nothing is rolled back when a later step fails: the account stays
    /// signed in with an identity-only user and the call returns
    /// [`GraceError::IncompleteRegistration`].
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        let _guard = self.transition.lock().await;
        let mut auth = self
            .identity
            .create_account(&registration.email, &registration.password)
            .await?;
        tracing::info!("[Session] Created account {}", auth.uid);

        let display_name = registration.display_name();
        if let Err(e) = self
            .identity
            .update_display_name(&auth.uid, &display_name)
            .await
        {
            return Err(self.incomplete_registration(auth, e));
        }
        auth.display_name = Some(display_name);

        let profile = UserProfile::from_registration(&auth.uid, registration, self.clock.now());
        if let Err(e) = self.profiles.save(&profile).await {
            return Err(self.incomplete_registration(auth, e));
        }

        let user = User::merge(&auth, Some(&profile));
        self.apply(Some(auth), SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    fn incomplete_registration(&self, auth: AuthUser, cause: GraceError) -> GraceError {
        tracing::warn!(
            "[Session] Registration of {} left incomplete: {}",
            auth.uid,
            cause
        );
        let user = User::merge(&auth, None);
        let user_id = auth.uid.clone();
        self.apply(Some(auth), SessionState::Authenticated(user));
        GraceError::IncompleteRegistration {
            user_id,
            cause: Box::new(cause),
        }
    }

    pub async fn logout(&self) -> Result<()> {
        let _guard = self.transition.lock().await;
        self.identity.sign_out().await?;
        self.apply(None, SessionState::Anonymous);
        tracing::info!("[Session] Logged out");
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.identity.send_password_reset(email).await?;
        tracing::info!("[Session] Password reset requested");
        Ok(())
    }

    /// Partially updates the profile of `user_id`, stamping `updated_at`.
    ///
    /// When the name changes for the signed-in user the provider display
    /// name follows, and the session user is re-read from the store.
    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let _guard = self.transition.lock().await;
        self.profiles
            .update(user_id, update, self.clock.now())
            .await?;
        tracing::info!("[Session] Updated profile of {}", user_id);

        let Some(mut auth) = self
            .identity
            .current_user()
            .filter(|auth| auth.uid == user_id)
        else {
            return Ok(());
        };

        let profile = self.profiles.find_by_id(user_id).await?;
        if update.changes_name() {
            if let Some(profile) = &profile {
                let display_name = profile.full_name();
                self.identity
                    .update_display_name(user_id, &display_name)
                    .await?;
                auth.display_name = Some(display_name);
            }
        }

        let user = User::merge(&auth, profile.as_ref());
        self.apply(Some(auth), SessionState::Authenticated(user));
        Ok(())
    }

    /// Re-reads the profile of the signed-in account and re-merges it.
    pub async fn refresh_current_user(&self) -> Result<Option<User>> {
        let _guard = self.transition.lock().await;
        let Some(auth) = self.identity.current_user() else {
            return Ok(None);
        };
        let profile = self.profiles.find_by_id(&auth.uid).await?;
        let user = User::merge(&auth, profile.as_ref());
        self.apply(Some(auth), SessionState::Authenticated(user.clone()));
        Ok(Some(user))
    }

    /// Applies one provider-pushed auth state.
    ///
    /// If the profile cannot be read the session still becomes
    /// authenticated with the identity-only user and the error is returned.
    pub async fn handle_provider_state(&self, state: ProviderAuthState) -> Result<()> {
        let _guard = self.transition.lock().await;
        match state {
            ProviderAuthState::Unresolved => Ok(()),
            ProviderAuthState::SignedOut => {
                self.apply(None, SessionState::Anonymous);
                Ok(())
            }
            ProviderAuthState::SignedIn(auth) => {
                if self.store.state().is_authenticated() && self.last_identity().as_ref() == Some(&auth) {
                    return Ok(());
                }
                match self.profiles.find_by_id(&auth.uid).await {
                    Ok(profile) => {
                        let user = User::merge(&auth, profile.as_ref());
                        self.apply(Some(auth), SessionState::Authenticated(user));
                        Ok(())
                    }
                    Err(e) => {
                        let user = User::merge(&auth, None);
                        self.apply(Some(auth), SessionState::Authenticated(user));
                        Err(e)
                    }
                }
            }
        }
    }

    /// Starts forwarding provider auth states to [`Self::handle_provider_state`].
    ///
    /// The current provider state is applied first. Calling this again
    /// replaces the previous listener.
    pub fn spawn_provider_listener(self: &Arc<Self>) {
        let mut receiver = self.identity.auth_state();
        let controller: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut next = Some(receiver.borrow_and_update().clone());
            while let Some(state) = next.take() {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                if let Err(e) = controller.handle_provider_state(state).await {
                    tracing::warn!("[Session] Failed to apply provider state: {}", e);
                }
                drop(controller);

                if receiver.changed().await.is_err() {
                    tracing::debug!("[Session] Provider state channel closed");
                    break;
                }
                next = Some(receiver.borrow_and_update().clone());
            }
        });

        if let Some(previous) = self.lock_listener().replace(handle) {
            previous.abort();
        }
        tracing::debug!("[Session] Provider listener started");
    }

    /// Stops the provider listener. Subscriptions stay registered.
    pub fn shutdown(&self) {
        if let Some(handle) = self.lock_listener().take() {
            handle.abort();
            tracing::debug!("[Session] Provider listener stopped");
        }
    }

    fn apply(&self, identity: Option<AuthUser>, state: SessionState) {
        *self
            .last_identity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = identity;
        self.store.replace(state);
    }

    fn last_identity(&self) -> Option<AuthUser> {
        self.last_identity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::dossier::SystemClock;
    use grace_infrastructure::{InMemoryDocumentStore, InMemoryIdentityProvider};

    fn registration() -> Registration {
        Registration {
            email: "marie@example.com".to_string(),
            password: "secret1".to_string(),
            first_name: "Marie".to_string(),
            last_name: "Curie".to_string(),
            phone: "0612345678".to_string(),
            address: None,
            city: Some("Paris".to_string()),
            postal_code: None,
        }
    }

    fn controller(
        identity: Arc<InMemoryIdentityProvider>,
        store: Arc<InMemoryDocumentStore>,
    ) -> Arc<SessionController> {
        SessionController::new(identity, store, Arc::new(SystemClock::new()))
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let controller = controller(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(InMemoryDocumentStore::new()),
        );
        assert_eq!(controller.state(), SessionState::Loading);
        assert!(controller.current_user().is_none());
    }

    #[tokio::test]
    async fn test_signed_in_event_is_idempotent() {
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let store = Arc::new(InMemoryDocumentStore::new());
        let controller = controller(identity.clone(), store.clone());
        let user = controller.register(&registration()).await.unwrap();

        // A failing profile read proves the repeated event is skipped.
        store.fail_next(GraceError::NetworkUnavailable);
        let auth = identity.current_user().unwrap();
        controller
            .handle_provider_state(ProviderAuthState::SignedIn(auth))
            .await
            .unwrap();
        assert_eq!(controller.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_profile_read_failure_keeps_identity() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let controller = controller(Arc::new(InMemoryIdentityProvider::new()), store.clone());
        store.fail_next(GraceError::NetworkUnavailable);

        let auth = AuthUser {
            uid: "u1".to_string(),
            email: "a@b.fr".to_string(),
            display_name: None,
        };
        let err = controller
            .handle_provider_state(ProviderAuthState::SignedIn(auth))
            .await
            .unwrap_err();
        assert_eq!(err, GraceError::NetworkUnavailable);

        let user = controller.current_user().unwrap();
        assert_eq!(user.id, "u1");
        assert!(!user.has_profile);
    }

    #[tokio::test]
    async fn test_unresolved_is_ignored() {
        let controller = controller(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(InMemoryDocumentStore::new()),
        );
        controller
            .handle_provider_state(ProviderAuthState::Unresolved)
            .await
            .unwrap();
        assert!(controller.state().is_loading());
    }

    #[tokio::test]
    async fn test_empty_profile_update_is_noop() {
        let controller = controller(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(InMemoryDocumentStore::new()),
        );
        // No profile exists; an empty update must not reach the store.
        controller
            .update_profile("nobody", &ProfileUpdate::default())
            .await
            .unwrap();
    }
}
