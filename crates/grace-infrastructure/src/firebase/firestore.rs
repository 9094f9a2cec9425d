//! Firestore REST adapter for profiles and dossiers.
//!
//! Document layout:
//! ```text
//! projects/{project}/databases/(default)/documents/
//! └── users/{uid}                       # UserProfile
//!     └── dossiers/{dossier_id}         # Dossier
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grace_core::config::BackendConfig;
use grace_core::dossier::{Dossier, DossierPatch, DossierRepository};
use grace_core::error::{GraceError, Result};
use grace_core::user::{ProfileRepository, ProfileUpdate, UserProfile};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::client::{TokenSource, build_http_client, firestore_error, map_transport_error};
use super::value::{
    Document, Fields, decode_dossier, decode_profile, encode_dossier, encode_dossier_patch,
    encode_profile, encode_profile_update,
};

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document: Option<Document>,
}

pub struct FirestoreDocumentStore {
    http: reqwest::Client,
    documents_root: String,
    users_collection: String,
    dossiers_collection: String,
    tokens: Arc<dyn TokenSource>,
}

impl FirestoreDocumentStore {
    pub fn new(config: &BackendConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        if config.project_id.is_empty() {
            return Err(GraceError::config(
                "backend.project_id is required for the firebase backend",
            ));
        }
        Ok(Self {
            http: build_http_client(config)?,
            documents_root: format!(
                "{}/projects/{}/databases/(default)/documents",
                config.firestore_endpoint.trim_end_matches('/'),
                config.project_id
            ),
            users_collection: config.users_collection.clone(),
            dossiers_collection: config.dossiers_collection.clone(),
            tokens,
        })
    }

    fn profile_url(&self, uid: &str) -> String {
        format!("{}/{}/{}", self.documents_root, self.users_collection, uid)
    }

    fn dossiers_url(&self, user_id: &str) -> String {
        format!("{}/{}", self.profile_url(user_id), self.dossiers_collection)
    }

    fn dossier_url(&self, user_id: &str, dossier_id: &str) -> String {
        format!("{}/{}", self.dossiers_url(user_id), dossier_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.id_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_document(&self, url: String, entity_type: &'static str, id: &str) -> Result<Option<Document>> {
        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(map_transport_error)?;
        match response.status() {
            status if status.is_success() => {
                Ok(Some(response.json().await.map_err(map_transport_error)?))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(firestore_error(response, entity_type, id).await),
        }
    }

    /// PATCH with an update mask and an existence precondition.
    async fn patch_existing(
        &self,
        url: String,
        fields: Fields,
        mask: Vec<String>,
        entity_type: &'static str,
        id: &str,
    ) -> Result<()> {
        let mut query: Vec<(&str, String)> = mask
            .into_iter()
            .map(|path| ("updateMask.fieldPaths", path))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let response = self
            .authorized(self.http.patch(url).query(&query))
            .json(&Document::from_fields(fields))
            .send()
            .await
            .map_err(map_transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(firestore_error(response, entity_type, id).await)
        }
    }
}

#[async_trait]
impl ProfileRepository for FirestoreDocumentStore {
    async fn find_by_id(&self, uid: &str) -> Result<Option<UserProfile>> {
        self.get_document(self.profile_url(uid), "profile", uid)
            .await?
            .map(|document| decode_profile(&document))
            .transpose()
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        // PATCH without a mask replaces the whole document, creating it if needed.
        let response = self
            .authorized(self.http.patch(self.profile_url(&profile.uid)))
            .json(&Document::from_fields(encode_profile(profile)))
            .send()
            .await
            .map_err(map_transport_error)?;
        if response.status().is_success() {
            tracing::debug!("[Firestore] Saved profile {}", profile.uid);
            Ok(())
        } else {
            Err(firestore_error(response, "profile", &profile.uid).await)
        }
    }

    async fn update(
        &self,
        uid: &str,
        update: &ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let (fields, mask) = encode_profile_update(update, updated_at);
        self.patch_existing(self.profile_url(uid), fields, mask, "profile", uid)
            .await
    }
}

#[async_trait]
impl DossierRepository for FirestoreDocumentStore {
    async fn create(&self, dossier: &Dossier) -> Result<()> {
        // POST with an explicit documentId fails with ALREADY_EXISTS instead of overwriting.
        let response = self
            .authorized(
                self.http
                    .post(self.dossiers_url(&dossier.user_id))
                    .query(&[("documentId", dossier.id.as_str())]),
            )
            .json(&Document::from_fields(encode_dossier(dossier)))
            .send()
            .await
            .map_err(map_transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(firestore_error(response, "dossier", &dossier.id).await)
        }
    }

    async fn find_by_id(&self, user_id: &str, dossier_id: &str) -> Result<Option<Dossier>> {
        self.get_document(self.dossier_url(user_id, dossier_id), "dossier", dossier_id)
            .await?
            .map(|document| decode_dossier(&document, user_id))
            .transpose()
    }

    async fn list_by_created_desc(&self, user_id: &str) -> Result<Vec<Dossier>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.dossiers_collection }],
                "orderBy": [{
                    "field": { "fieldPath": "createdAt" },
                    "direction": "DESCENDING"
                }]
            }
        });
        let response = self
            .authorized(
                self.http
                    .post(format!("{}:runQuery", self.profile_url(user_id))),
            )
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(firestore_error(response, "dossier", user_id).await);
        }

        let results: Vec<QueryResult> = response.json().await.map_err(map_transport_error)?;
        // An empty collection yields a single element without `document`.
        results
            .into_iter()
            .filter_map(|result| result.document)
            .map(|document| decode_dossier(&document, user_id))
            .collect()
    }

    async fn update(
        &self,
        user_id: &str,
        dossier_id: &str,
        patch: &DossierPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let (fields, mask) = encode_dossier_patch(patch, updated_at);
        self.patch_existing(
            self.dossier_url(user_id, dossier_id),
            fields,
            mask,
            "dossier",
            dossier_id,
        )
        .await
    }

    async fn delete(&self, user_id: &str, dossier_id: &str) -> Result<()> {
        let response = self
            .authorized(self.http.delete(self.dossier_url(user_id, dossier_id)))
            .send()
            .await
            .map_err(map_transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(firestore_error(response, "dossier", dossier_id).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoToken;

    impl TokenSource for NoToken {
        fn id_token(&self) -> Option<String> {
            None
        }
    }

    fn config() -> BackendConfig {
        BackendConfig {
            project_id: "grace-demo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_project_id() {
        let result = FirestoreDocumentStore::new(&BackendConfig::default(), Arc::new(NoToken));
        assert!(matches!(result, Err(GraceError::Config(_))));
    }

    #[test]
    fn test_document_paths() {
        let store = FirestoreDocumentStore::new(&config(), Arc::new(NoToken)).unwrap();
        assert_eq!(
            store.profile_url("u1"),
            "https://firestore.googleapis.com/v1/projects/grace-demo/databases/(default)/documents/users/u1"
        );
        assert_eq!(
            store.dossier_url("u1", "DOS-1"),
            "https://firestore.googleapis.com/v1/projects/grace-demo/databases/(default)/documents/users/u1/dossiers/DOS-1"
        );
    }

    #[test]
    fn test_empty_query_result_shape() {
        let results: Vec<QueryResult> =
            serde_json::from_str(r#"[{"readTime": "2024-01-01T00:00:00Z"}]"#).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].document.is_none());
    }
}
