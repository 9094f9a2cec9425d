//! Path management for GRaCE configuration files.
//!
//! ```text
//! ~/.config/grace/          # Config directory (platform equivalent elsewhere)
//! └── config.toml           # Application configuration
//! ```

use std::path::{Path, PathBuf};

use grace_core::error::{GraceError, Result};

const APP_DIR: &str = "grace";
const CONFIG_FILE: &str = "config.toml";

/// Resolves GRaCE paths, optionally under a custom base directory (tests).
#[derive(Debug, Clone, Default)]
pub struct GracePaths {
    base_dir: Option<PathBuf>,
}

impl GracePaths {
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
        }
    }

    /// Configuration directory: `<base>` or `<platform config dir>/grace`.
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| GraceError::config("Cannot find the user configuration directory")),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_base_dir() {
        let paths = GracePaths::new(Some(Path::new("/tmp/grace-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/grace-test/config.toml")
        );
    }

    #[test]
    fn test_default_dir_ends_with_app_name() {
        if let Ok(dir) = GracePaths::default().config_dir() {
            assert!(dir.ends_with(APP_DIR));
        }
    }
}
