//! Configuration model.
//!
//! Every section has defaults, so an empty file (or no file) is a valid
//! configuration that runs against the in-memory backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::user::DEFAULT_MIN_PASSWORD_LEN;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GraceConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub dossiers: DossierConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GraceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Firebase,
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub project_id: String,
    pub api_key: String,
    pub identity_endpoint: String,
    pub firestore_endpoint: String,
    pub request_timeout_secs: u64,
    pub users_collection: String,
    pub dossiers_collection: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            project_id: String::new(),
            api_key: String::new(),
            identity_endpoint: "https://identitytoolkit.googleapis.com/v1".to_string(),
            firestore_endpoint: "https://firestore.googleapis.com/v1".to_string(),
            request_timeout_secs: 30,
            users_collection: "users".to_string(),
            dossiers_collection: "dossiers".to_string(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("BackendConfig")
            .field("kind", &self.kind)
            .field("project_id", &self.project_id)
            .field("api_key", &api_key)
            .field("identity_endpoint", &self.identity_endpoint)
            .field("firestore_endpoint", &self.firestore_endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("users_collection", &self.users_collection)
            .field("dossiers_collection", &self.dossiers_collection)
            .finish()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Timestamp,
    Uuid,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DossierConfig {
    pub id_strategy: IdStrategy,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_password_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LEN,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
