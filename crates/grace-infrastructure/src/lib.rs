//! Backend adapters for GRaCE.
//!
//! - [`memory`]: in-process provider and store, for tests and offline use.
//! - [`firebase`]: Identity Toolkit and Firestore over REST.
//! - [`ConfigService`]: loads `config.toml` with `GRACE_*` overrides.

pub mod backend;
pub mod config_service;
pub mod firebase;
pub mod memory;
pub mod paths;

pub use backend::Backend;
pub use config_service::ConfigService;
pub use memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
pub use paths::GracePaths;
