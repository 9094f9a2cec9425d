//! Domain layer for GRaCE.
//!
//! Holds the models, the ports implemented by backend adapters
//! ([`auth::IdentityProvider`], [`user::ProfileRepository`],
//! [`dossier::DossierRepository`]), the observable session store and the
//! navigation contract.

pub mod auth;
pub mod config;
pub mod dossier;
pub mod error;
pub mod navigation;
pub mod session;
pub mod user;

// Re-export common error type
pub use error::{ErrorKind, GraceError, Operation, Result};
