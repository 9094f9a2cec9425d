//! Identity Toolkit (Firebase Authentication) REST adapter.
//!
//! The REST API has no push channel, so this adapter is itself the source of
//! auth-state events: it publishes `SignedIn` after sign-up / sign-in and
//! `SignedOut` after sign-out.

use std::sync::RwLock;

use async_trait::async_trait;
use grace_core::auth::{AuthUser, IdentityProvider, ProviderAuthState};
use grace_core::config::BackendConfig;
use grace_core::error::{GraceError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;

use super::client::{TokenSource, build_http_client, identity_json, map_transport_error};

#[derive(Debug, Clone)]
struct FirebaseSession {
    user: AuthUser,
    /// Valid for one hour; there is no refresh exchange.
    id_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

pub struct FirebaseIdentityProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    session: RwLock<Option<FirebaseSession>>,
    state: watch::Sender<ProviderAuthState>,
}

impl FirebaseIdentityProvider {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(GraceError::config("backend.api_key is required for the firebase backend"));
        }
        let (state, _) = watch::channel(ProviderAuthState::SignedOut);
        Ok(Self {
            http: build_http_client(config)?,
            endpoint: config.identity_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            session: RwLock::new(None),
            state,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.endpoint, method, self.api_key)
    }

    async fn post<T, B>(&self, method: &str, body: &B, subject: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        identity_json(response, subject).await
    }

    async fn authenticate(&self, method: &str, email: &str, password: &str) -> Result<AuthUser> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: AuthResponse = self.post(method, &request, email).await?;
        let user = AuthUser {
            uid: response.local_id,
            email: if response.email.is_empty() {
                email.to_string()
            } else {
                response.email
            },
            display_name: response.display_name.filter(|name| !name.is_empty()),
        };

        *self.session_mut() = Some(FirebaseSession {
            user: user.clone(),
            id_token: response.id_token,
        });
        self.state.send_replace(ProviderAuthState::SignedIn(user.clone()));
        tracing::info!("[Firebase] Signed in account {}", user.uid);
        Ok(user)
    }

    fn session_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<FirebaseSession>> {
        self.session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn session(&self) -> Option<FirebaseSession> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.authenticate("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.authenticate("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        *self.session_mut() = None;
        self.state.send_replace(ProviderAuthState::SignedOut);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        let _: serde_json::Value = self.post("sendOobCode", &body, email).await?;
        Ok(())
    }

    async fn update_display_name(&self, uid: &str, display_name: &str) -> Result<()> {
        let session = self
            .session()
            .filter(|session| session.user.uid == uid)
            .ok_or_else(|| GraceError::not_found("user", uid))?;

        let body = json!({
            "idToken": session.id_token,
            "displayName": display_name,
            "returnSecureToken": false,
        });
        let _: serde_json::Value = self.post("update", &body, uid).await?;

        if let Some(session) = self.session_mut().as_mut() {
            session.user.display_name = Some(display_name.to_string());
        }
        self.state.send_if_modified(|state| {
            if let ProviderAuthState::SignedIn(user) = state {
                user.display_name = Some(display_name.to_string());
            }
            false
        });
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session().map(|session| session.user)
    }

    fn auth_state(&self) -> watch::Receiver<ProviderAuthState> {
        self.state.subscribe()
    }
}

impl TokenSource for FirebaseIdentityProvider {
    fn id_token(&self) -> Option<String> {
        self.session().map(|session| session.id_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let err = FirebaseIdentityProvider::new(&BackendConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, GraceError::Config(_)));
    }

    #[test]
    fn test_urls() {
        let provider = FirebaseIdentityProvider::new(&config()).unwrap();
        assert_eq!(
            provider.url("signInWithPassword"),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=test-key"
        );
    }

    #[tokio::test]
    async fn test_starts_signed_out_and_update_requires_session() {
        let provider = FirebaseIdentityProvider::new(&config()).unwrap();
        assert_eq!(*provider.auth_state().borrow(), ProviderAuthState::SignedOut);
        assert!(provider.id_token().is_none());
        let err = provider.update_display_name("u1", "Ada").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_auth_response_shape() {
        let response: AuthResponse = serde_json::from_value(json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "abc",
            "email": "x@example.com",
            "displayName": "",
            "idToken": "token",
            "registered": true,
            "refreshToken": "refresh",
            "expiresIn": "3600"
        }))
        .unwrap();
        assert_eq!(response.local_id, "abc");
        assert_eq!(response.display_name.as_deref(), Some(""));
    }

    #[test]
    fn test_auth_response_minimal_shape() {
        let response: AuthResponse = serde_json::from_value(json!({
            "localId": "abc",
            "idToken": "token"
        }))
        .unwrap();
        assert_eq!(response.id_token, "token");
        assert!(response.email.is_empty());
        assert!(response.display_name.is_none());
    }
}
