//! HTTP plumbing shared by the Firebase adapters.

use std::time::Duration;

use grace_core::auth::map_provider_code;
use grace_core::config::BackendConfig;
use grace_core::error::{GraceError, Result};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Supplies the bearer token of the signed-in account.
pub trait TokenSource: Send + Sync {
    fn id_token(&self) -> Option<String>;
}

/// `{"error": {"code": 400, "message": "EMAIL_EXISTS", "status": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub fn build_http_client(config: &BackendConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| GraceError::config(format!("Failed to build HTTP client: {}", e)))
}

/// Maps a transport-level failure. Details are logged, not returned.
pub fn map_transport_error(err: reqwest::Error) -> GraceError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        tracing::warn!("[Firebase] Network failure: {}", err);
        GraceError::NetworkUnavailable
    } else if err.is_decode() {
        GraceError::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    } else {
        tracing::warn!("[Firebase] Unexpected HTTP failure: {}", err);
        GraceError::unknown("transport")
    }
}

/// Reads a successful JSON body, or converts the error envelope of an
/// Identity Toolkit response into a [`GraceError`].
pub async fn identity_json<T: DeserializeOwned>(response: Response, subject: &str) -> Result<T> {
    if response.status().is_success() {
        return response.json::<T>().await.map_err(map_transport_error);
    }
    let status = response.status();
    let envelope = response.json::<ErrorEnvelope>().await.ok();
    let code = envelope
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.as_str().to_string());
    tracing::debug!("[Firebase] Identity request failed: {} {}", status, code);
    Err(map_provider_code(&code, subject))
}

/// Converts a non-success Firestore response into a [`GraceError`].
pub async fn firestore_error(response: Response, entity_type: &'static str, id: &str) -> GraceError {
    let status = response.status();
    let envelope = response.json::<ErrorEnvelope>().await.ok();
    let code = envelope
        .map(|e| e.error.status)
        .filter(|s| !s.is_empty())
        .unwrap_or_default();
    tracing::debug!("[Firestore] Request failed: {} {} ({} '{}')", status, code, entity_type, id);
    map_firestore_status(status, &code, entity_type, id)
}

pub fn map_firestore_status(
    status: StatusCode,
    code: &str,
    entity_type: &'static str,
    id: &str,
) -> GraceError {
    match (status, code) {
        (_, "NOT_FOUND") | (StatusCode::NOT_FOUND, _) => GraceError::not_found(entity_type, id),
        (_, "ALREADY_EXISTS") | (StatusCode::CONFLICT, _) => {
            GraceError::already_exists(entity_type, id)
        }
        (_, "RESOURCE_EXHAUSTED") | (StatusCode::TOO_MANY_REQUESTS, _) => GraceError::RateLimited,
        (_, "UNAUTHENTICATED") | (StatusCode::UNAUTHORIZED, _) => GraceError::InvalidCredential,
        (_, "UNAVAILABLE") | (StatusCode::SERVICE_UNAVAILABLE, _) => GraceError::NetworkUnavailable,
        (_, "") => GraceError::unknown(status.as_str()),
        (_, code) => GraceError::unknown(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grace_core::ErrorKind;

    #[test]
    fn test_firestore_status_mapping() {
        let cases = [
            (StatusCode::NOT_FOUND, "NOT_FOUND", ErrorKind::NotFound),
            (StatusCode::CONFLICT, "ALREADY_EXISTS", ErrorKind::Conflict),
            (StatusCode::BAD_REQUEST, "FAILED_PRECONDITION", ErrorKind::Unknown),
            (StatusCode::TOO_MANY_REQUESTS, "", ErrorKind::RateLimited),
            (StatusCode::UNAUTHORIZED, "", ErrorKind::InvalidCredential),
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", ErrorKind::NetworkUnavailable),
        ];
        for (status, code, kind) in cases {
            assert_eq!(
                map_firestore_status(status, code, "dossier", "DOS-1").kind(),
                kind,
                "{status} {code}"
            );
        }
    }

    #[test]
    fn test_permission_denied_is_unknown_with_code() {
        assert_eq!(
            map_firestore_status(StatusCode::FORBIDDEN, "PERMISSION_DENIED", "dossier", "x"),
            GraceError::unknown("PERMISSION_DENIED")
        );
    }
}
