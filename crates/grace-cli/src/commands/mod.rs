pub mod auth;
pub mod config;
pub mod dossiers;

use grace_core::{GraceError, Operation};

/// Turns a domain error into the French message shown to the user.
pub fn user_error(err: GraceError, operation: Operation) -> anyhow::Error {
    tracing::debug!("[Cli] {:?} failed: {:?}", operation, err);
    anyhow::anyhow!(err.localized_message_for(operation))
}
