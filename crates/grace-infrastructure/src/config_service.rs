//! Configuration service implementation.
//!
//! Loads [`GraceConfig`] from `config.toml` (see [`GracePaths`]), applies
//! environment overrides and caches the result.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use grace_core::config::{BackendKind, GraceConfig};
use grace_core::error::{GraceError, Result};

use crate::paths::GracePaths;

/// Path of an alternative configuration file.
pub const ENV_CONFIG_PATH: &str = "GRACE_CONFIG";
pub const ENV_BACKEND: &str = "GRACE_BACKEND";
pub const ENV_API_KEY: &str = "GRACE_API_KEY";
pub const ENV_PROJECT_ID: &str = "GRACE_PROJECT_ID";

/// Configuration service that loads and caches the configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<GraceConfig>>>,
}

impl ConfigService {
    /// Service reading `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service reading `$GRACE_CONFIG`, or the default location.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(ENV_CONFIG_PATH) {
            Some(path) => Ok(Self::with_path(path)),
            None => Ok(Self::with_path(GracePaths::default().config_file()?)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading it from file if not cached.
    ///
    /// A missing file yields the defaults.
    pub fn get_config(&self) -> Result<GraceConfig> {
        // Check if already cached
        {
            let read_lock = self
                .config
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = Self::load_file(&self.path)?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());
        tracing::debug!("[Config] Loaded configuration from {:?}", self.path);

        // Cache it
        {
            let mut write_lock = self
                .config
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Writes `config` to the file, creating parent directories.
    pub fn save(&self, config: &GraceConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GraceError::config(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }
        let content = config.to_toml_string()?;
        std::fs::write(&self.path, content)
            .map_err(|e| GraceError::config(format!("Failed to write {:?}: {}", self.path, e)))?;
        self.invalidate_cache();
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *write_lock = None;
    }

    fn load_file(path: &Path) -> Result<GraceConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => GraceConfig::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(GraceConfig::default()),
            Err(e) => Err(GraceError::config(format!("Failed to read {:?}: {}", path, e))),
        }
    }
}

/// Applies `GRACE_*` overrides looked up through `lookup`.
pub fn apply_env_overrides(config: &mut GraceConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(kind) = lookup(ENV_BACKEND) {
        match kind.to_lowercase().as_str() {
            "memory" => config.backend.kind = BackendKind::Memory,
            "firebase" => config.backend.kind = BackendKind::Firebase,
            other => tracing::warn!("[Config] Ignoring unknown {}={}", ENV_BACKEND, other),
        }
    }
    if let Some(api_key) = lookup(ENV_API_KEY) {
        config.backend.api_key = api_key;
    }
    if let Some(project_id) = lookup(ENV_PROJECT_ID) {
        config.backend.project_id = project_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        assert_eq!(
            ConfigService::load_file(service.path()).unwrap(),
            GraceConfig::default()
        );
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("nested/config.toml"));

        let mut config = GraceConfig::default();
        config.backend.kind = BackendKind::Firebase;
        config.backend.project_id = "grace-demo".to_string();
        config.validation.min_password_length = 8;
        service.save(&config).unwrap();

        let loaded = ConfigService::load_file(service.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "backend = 3").unwrap();
        assert!(ConfigService::load_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKEND, "Firebase"),
            (ENV_API_KEY, "AIza-env"),
        ]);
        let mut config = GraceConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.backend.kind, BackendKind::Firebase);
        assert_eq!(config.backend.api_key, "AIza-env");
        assert_eq!(config.backend.project_id, "");
    }
}
