//! Error types for the GRaCE client core.

use std::fmt;

use thiserror::Error;

use crate::user::ValidationError;

/// A shared error type for every GRaCE operation.
///
/// Backend failures are converted into one of these variants at the adapter
/// boundary (see [`crate::auth::map_provider_code`]); callers only ever see
/// this closed set, never the backend's own messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraceError {
    /// Email/password pair rejected by the identity provider.
    #[error("Invalid credential")]
    InvalidCredential,

    /// An account already exists for this email.
    #[error("An account already exists for this email")]
    AccountExists,

    /// Password refused by the identity provider as too weak.
    #[error("Password is too weak")]
    WeakCredential,

    /// Too many attempts, the provider is throttling this client.
    #[error("Too many requests, try again later")]
    RateLimited,

    /// The backend could not be reached.
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A create-only write hit an existing record.
    #[error("Entity already exists: {entity_type} '{id}'")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// Client-side input validation failed.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The provider account was created but its profile record was not.
    ///
    /// The account is not rolled back; the session is authenticated with the
    /// identity-only user.
    #[error("Account '{user_id}' created but its profile was not saved: {cause}")]
    IncompleteRegistration {
        user_id: String,
        cause: Box<GraceError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Anything the boundary could not classify. Holds the backend error code.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Closed classification of [`GraceError`], used by screens to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCredential,
    AccountExists,
    WeakCredential,
    RateLimited,
    NetworkUnavailable,
    NotFound,
    Conflict,
    InvalidInput,
    Unknown,
}

/// The user-facing operation an error came from.
///
/// Some kinds are worded differently depending on the screen that triggered
/// them (a missing user reads differently on login than on recovery).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    ResetPassword,
    LoadDossiers,
    LoadDossier,
    CreateDossier,
    DeleteDossier,
}

impl GraceError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an AlreadyExists error
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Unknown error carrying the backend code
    pub fn unknown(code: impl Into<String>) -> Self {
        Self::Unknown(code.into())
    }

    // ============================================================================
    // Classification
    // ============================================================================

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredential => ErrorKind::InvalidCredential,
            Self::AccountExists => ErrorKind::AccountExists,
            Self::WeakCredential => ErrorKind::WeakCredential,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::NetworkUnavailable => ErrorKind::NetworkUnavailable,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::Conflict,
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::IncompleteRegistration { .. }
            | Self::Config(_)
            | Self::Serialization { .. }
            | Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    // ============================================================================
    // Localization
    // ============================================================================

    /// Generic French message for this error, independent of the screen.
    pub fn localized_message(&self) -> String {
        match self {
            Self::Validation(err) => err.message().to_string(),
            _ => self.kind().message().to_string(),
        }
    }

    /// French message worded for the screen that triggered the operation.
    pub fn localized_message_for(&self, operation: Operation) -> String {
        let kind = self.kind();
        let specific = match (operation, kind) {
            (Operation::Login, ErrorKind::NotFound) => Some("Utilisateur non trouvé"),
            (Operation::Login, ErrorKind::InvalidCredential) => Some("Mot de passe incorrect"),
            (Operation::Login, ErrorKind::Unknown) => Some("Identifiants incorrects"),
            (Operation::Register, ErrorKind::Unknown) => Some("Erreur lors de l'inscription"),
            (Operation::ResetPassword, ErrorKind::NotFound) => {
                Some("Aucun compte associé à cet email")
            }
            (Operation::ResetPassword, ErrorKind::Unknown) => {
                Some("Erreur lors de l'envoi de l'email")
            }
            (Operation::LoadDossiers, _) if kind != ErrorKind::NetworkUnavailable => {
                Some("Impossible de charger les dossiers")
            }
            (Operation::LoadDossier, _) if kind != ErrorKind::NetworkUnavailable => {
                Some("Impossible de charger le dossier")
            }
            (Operation::CreateDossier, _) if kind != ErrorKind::NetworkUnavailable => {
                Some("Impossible de créer le dossier")
            }
            (Operation::DeleteDossier, _) if kind != ErrorKind::NetworkUnavailable => {
                Some("Impossible de supprimer le dossier")
            }
            _ => None,
        };
        match specific {
            Some(message) => message.to_string(),
            None => self.localized_message(),
        }
    }
}

impl ErrorKind {
    /// Default French message for the kind.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidCredential => "Identifiants incorrects",
            ErrorKind::AccountExists => "Cet email est déjà utilisé",
            ErrorKind::WeakCredential => "Le mot de passe est trop faible",
            ErrorKind::RateLimited => "Trop de tentatives. Réessayez plus tard",
            ErrorKind::NetworkUnavailable => "Problème de connexion internet",
            ErrorKind::NotFound => "Élément introuvable",
            ErrorKind::Conflict => "Cet élément existe déjà",
            ErrorKind::InvalidInput => "Saisie invalide",
            ErrorKind::Unknown => "Une erreur est survenue",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<serde_json::Error> for GraceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GraceError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for GraceError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, GraceError>`.
pub type Result<T> = std::result::Result<T, GraceError>;
