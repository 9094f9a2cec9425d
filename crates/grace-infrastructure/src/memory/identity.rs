//! In-memory identity provider.
//!
//! Behaves like the managed provider as far as the client can observe:
//! account creation signs the new account in, failures are reported as
//! provider codes and go through the same boundary mapping.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use grace_core::auth::{AuthUser, IdentityProvider, ProviderAuthState, map_provider_code};
use grace_core::error::Result;
use grace_core::user::DEFAULT_MIN_PASSWORD_LEN;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: String,
}

/// Identity provider keeping accounts in process memory.
pub struct InMemoryIdentityProvider {
    /// Accounts keyed by lowercased email.
    accounts: RwLock<HashMap<String, Account>>,
    state: watch::Sender<ProviderAuthState>,
    min_password_len: usize,
    reset_requests: Mutex<Vec<String>>,
    /// Provider code returned by the next call instead of running it.
    next_failure: Mutex<Option<String>>,
}

impl InMemoryIdentityProvider {
    /// Provider that has already resolved to signed-out.
    pub fn new() -> Self {
        Self::with_state(ProviderAuthState::SignedOut)
    }

    /// Provider that stays `Unresolved` until [`Self::resolve`] is called.
    pub fn unresolved() -> Self {
        Self::with_state(ProviderAuthState::Unresolved)
    }

    fn with_state(initial: ProviderAuthState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            accounts: RwLock::new(HashMap::new()),
            state,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            reset_requests: Mutex::new(Vec::new()),
            next_failure: Mutex::new(None),
        }
    }

    pub fn with_min_password_len(mut self, min: usize) -> Self {
        self.min_password_len = min;
        self
    }

    /// Finishes restoring the persisted session: signed out.
    pub fn resolve(&self) {
        self.state.send_if_modified(|state| {
            if *state == ProviderAuthState::Unresolved {
                *state = ProviderAuthState::SignedOut;
                true
            } else {
                false
            }
        });
    }

    /// Makes the next provider call fail with `code` (e.g. `auth/network-request-failed`).
    pub fn fail_next(&self, code: impl Into<String>) {
        *lock(&self.next_failure) = Some(code.into());
    }

    /// Simulates a sign-out pushed by the provider (expired or revoked session).
    pub fn expire_session(&self) {
        self.state.send_replace(ProviderAuthState::SignedOut);
    }

    /// Emails that received a password reset link, in order.
    pub fn reset_requests(&self) -> Vec<String> {
        lock(&self.reset_requests).clone()
    }

    pub fn account_count(&self) -> usize {
        read(&self.accounts).len()
    }

    fn take_failure(&self, subject: &str) -> Result<()> {
        match lock(&self.next_failure).take() {
            Some(code) => Err(map_provider_code(&code, subject)),
            None => Ok(()),
        }
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.take_failure(email)?;
        if password.chars().count() < self.min_password_len {
            return Err(map_provider_code("auth/weak-password", email));
        }

        let user = {
            let mut accounts = write(&self.accounts);
            let key = Self::key(email);
            if accounts.contains_key(&key) {
                return Err(map_provider_code("auth/email-already-in-use", email));
            }
            let user = AuthUser {
                uid: Uuid::new_v4().simple().to_string(),
                email: email.trim().to_string(),
                display_name: None,
            };
            accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };

        self.state.send_replace(ProviderAuthState::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.take_failure(email)?;
        let user = {
            let accounts = read(&self.accounts);
            let account = accounts
                .get(&Self::key(email))
                .ok_or_else(|| map_provider_code("auth/user-not-found", email))?;
            if account.password != password {
                return Err(map_provider_code("auth/wrong-password", email));
            }
            account.user.clone()
        };

        self.state.send_replace(ProviderAuthState::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.take_failure("")?;
        self.state.send_replace(ProviderAuthState::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        self.take_failure(email)?;
        if !read(&self.accounts).contains_key(&Self::key(email)) {
            return Err(map_provider_code("auth/user-not-found", email));
        }
        lock(&self.reset_requests).push(email.trim().to_string());
        Ok(())
    }

    async fn update_display_name(&self, uid: &str, display_name: &str) -> Result<()> {
        self.take_failure(uid)?;
        let mut accounts = write(&self.accounts);
        let account = accounts
            .values_mut()
            .find(|account| account.user.uid == uid)
            .ok_or_else(|| map_provider_code("auth/user-not-found", uid))?;
        account.user.display_name = Some(display_name.to_string());
        let updated = account.user.clone();

        // Profile changes do not fire auth events; keep the signed-in copy current silently.
        self.state.send_if_modified(|state| {
            if let ProviderAuthState::SignedIn(current) = state {
                if current.uid == updated.uid {
                    *current = updated.clone();
                }
            }
            false
        });
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    fn auth_state(&self) -> watch::Receiver<ProviderAuthState> {
        self.state.subscribe()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::ErrorKind;

    #[tokio::test]
    async fn test_create_account_signs_in() {
        let provider = InMemoryIdentityProvider::new();
        let user = provider.create_account("a@example.com", "secret1").await.unwrap();
        assert_eq!(provider.current_user(), Some(user.clone()));
        assert_eq!(*provider.auth_state().borrow(), ProviderAuthState::SignedIn(user));
    }

    #[tokio::test]
    async fn test_duplicate_and_weak_accounts() {
        let provider = InMemoryIdentityProvider::new();
        provider.create_account("a@example.com", "secret1").await.unwrap();

        let err = provider.create_account("A@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccountExists);

        let err = provider.create_account("b@example.com", "123").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WeakCredential);
    }

    #[tokio::test]
    async fn test_sign_in_errors() {
        let provider = InMemoryIdentityProvider::new();
        provider.create_account("x@example.com", "goodpass").await.unwrap();
        provider.sign_out().await.unwrap();

        let err = provider.sign_in("x@example.com", "wrongpass").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);

        let err = provider.sign_in("y@example.com", "goodpass").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(provider.current_user().is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_is_mapped_once() {
        let provider = InMemoryIdentityProvider::new();
        provider.fail_next("auth/network-request-failed");
        let err = provider.send_password_reset("x@example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkUnavailable);

        let err = provider.send_password_reset("x@example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_display_name_does_not_notify() {
        let provider = InMemoryIdentityProvider::new();
        let user = provider.create_account("a@example.com", "secret1").await.unwrap();
        let mut rx = provider.auth_state();
        rx.borrow_and_update();

        provider.update_display_name(&user.uid, "Ada Lovelace").await.unwrap();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(
            provider.current_user().unwrap().display_name.as_deref(),
            Some("Ada Lovelace")
        );
    }

    #[test]
    fn test_unresolved_until_resolve() {
        let provider = InMemoryIdentityProvider::unresolved();
        assert_eq!(*provider.auth_state().borrow(), ProviderAuthState::Unresolved);
        provider.resolve();
        assert_eq!(*provider.auth_state().borrow(), ProviderAuthState::SignedOut);
    }
}
