//! Wiring of configuration, logging and use cases.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use grace_application::{DossierService, SessionController};
use grace_core::config::{BackendKind, GraceConfig};
use grace_core::dossier::SystemClock;
use grace_infrastructure::{Backend, ConfigService};
use tracing_subscriber::EnvFilter;

pub struct App {
    pub config: GraceConfig,
    pub session: Arc<SessionController>,
    pub dossiers: DossierService,
}

pub fn config_service(path: Option<PathBuf>) -> Result<ConfigService> {
    match path {
        Some(path) => Ok(ConfigService::with_path(path)),
        None => ConfigService::from_env().context("Failed to locate the configuration file"),
    }
}

impl App {
    pub fn bootstrap(config_service: &ConfigService, force_memory: bool) -> Result<Self> {
        let mut config = config_service
            .get_config()
            .context("Failed to load configuration")?;
        if force_memory {
            config.backend.kind = BackendKind::Memory;
        }
        init_tracing(&config.logging.level);
        tracing::info!("[Bootstrap] Configuration loaded from {:?}", config_service.path());

        let backend = Backend::from_config(&config.backend, config.validation.min_password_length)
            .context("Failed to initialize backend")?;
        let clock = Arc::new(SystemClock::new());
        let session = SessionController::new(backend.identity, backend.profiles, clock.clone());
        session.spawn_provider_listener();
        let dossiers = DossierService::from_config(backend.dossiers, &config.dossiers).with_clock(clock);

        Ok(Self {
            config,
            session,
            dossiers,
        })
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
