//! Provider error code mapping.
//!
//! Identity providers report failures as string codes. SDK spellings
//! (`auth/wrong-password`) and REST spellings (`INVALID_PASSWORD`, sometimes
//! followed by ` : <details>`) are both accepted.

use crate::error::GraceError;

/// Converts a provider error code into the closed [`GraceError`] set.
///
/// `subject` names what the request was about (usually the email) and is
/// used for `NotFound` errors.
pub fn map_provider_code(code: &str, subject: &str) -> GraceError {
    let head = code.split(" : ").next().unwrap_or(code).trim();
    let normalized = head
        .strip_prefix("auth/")
        .unwrap_or(head)
        .to_ascii_lowercase()
        .replace('_', "-");

    match normalized.as_str() {
        "user-not-found" | "email-not-found" => GraceError::not_found("user", subject),
        "wrong-password" | "invalid-password" | "invalid-credential"
        | "invalid-login-credentials" => GraceError::InvalidCredential,
        "email-already-in-use" | "email-exists" => GraceError::AccountExists,
        "weak-password" => GraceError::WeakCredential,
        "too-many-requests" | "too-many-attempts-try-later" => GraceError::RateLimited,
        "network-request-failed" => GraceError::NetworkUnavailable,
        "not-found" => GraceError::not_found("record", subject),
        _ => GraceError::unknown(head),
    }
}
