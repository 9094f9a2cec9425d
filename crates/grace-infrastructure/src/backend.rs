//! Adapter selection.

use std::sync::Arc;

use grace_core::auth::IdentityProvider;
use grace_core::config::{BackendConfig, BackendKind};
use grace_core::dossier::DossierRepository;
use grace_core::error::Result;
use grace_core::user::ProfileRepository;

use crate::firebase::{FirebaseIdentityProvider, FirestoreDocumentStore, TokenSource};
use crate::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};

/// The three ports wired to one backend.
#[derive(Clone)]
pub struct Backend {
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub dossiers: Arc<dyn DossierRepository>,
}

impl Backend {
    pub fn in_memory(min_password_len: usize) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        Self {
            identity: Arc::new(InMemoryIdentityProvider::new().with_min_password_len(min_password_len)),
            profiles: store.clone(),
            dossiers: store,
        }
    }

    pub fn firebase(config: &BackendConfig) -> Result<Self> {
        let identity = Arc::new(FirebaseIdentityProvider::new(config)?);
        let tokens: Arc<dyn TokenSource> = identity.clone();
        let store = Arc::new(FirestoreDocumentStore::new(config, tokens)?);
        Ok(Self {
            identity,
            profiles: store.clone(),
            dossiers: store,
        })
    }

    pub fn from_config(config: &BackendConfig, min_password_len: usize) -> Result<Self> {
        tracing::info!("[Backend] Using {:?} backend", config.kind);
        match config.kind {
            BackendKind::Memory => Ok(Self::in_memory(min_password_len)),
            BackendKind::Firebase => Self::firebase(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        let backend = Backend::from_config(&BackendConfig::default(), 6).unwrap();
        assert!(backend.identity.current_user().is_none());
    }

    #[test]
    fn test_firebase_backend_requires_credentials() {
        let config = BackendConfig {
            kind: BackendKind::Firebase,
            ..Default::default()
        };
        assert!(Backend::from_config(&config, 6).is_err());

        let config = BackendConfig {
            kind: BackendKind::Firebase,
            api_key: "key".to_string(),
            project_id: "grace-demo".to_string(),
            ..Default::default()
        };
        assert!(Backend::from_config(&config, 6).is_ok());
    }
}
