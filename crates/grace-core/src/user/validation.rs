//! Client-side validation of the authentication forms.
//!
//! Rules are checked in a fixed order and the first failure is reported,
//! so a screen always shows a single message.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::model::Registration;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\-+\s()]{10,}$").expect("valid phone regex"));

/// Default minimum password length, matching the identity provider.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required fields")]
    MissingFields,
    #[error("missing email")]
    MissingEmail,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("password shorter than {min} characters")]
    PasswordTooShort { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("terms of use not accepted")]
    TermsNotAccepted,
}

impl ValidationError {
    /// French message shown by the form.
    pub fn message(&self) -> String {
        match self {
            Self::MissingFields => "Veuillez remplir tous les champs obligatoires".to_string(),
            Self::MissingEmail => "Veuillez entrer votre adresse email".to_string(),
            Self::InvalidEmail => "Veuillez entrer une adresse email valide".to_string(),
            Self::InvalidPhone => {
                "Numéro de téléphone invalide (minimum 10 chiffres)".to_string()
            }
            Self::PasswordTooShort { min } => {
                format!("Le mot de passe doit contenir au moins {} caractères", min)
            }
            Self::PasswordMismatch => "Les mots de passe ne correspondent pas".to_string(),
            Self::TermsNotAccepted => {
                "Vous devez accepter les conditions d'utilisation".to_string()
            }
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whitespace is ignored; at least ten digits or phone punctuation.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Raw registration form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub accepted_terms: bool,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<Registration, ValidationError> {
        self.validate_with(DEFAULT_MIN_PASSWORD_LEN)
    }

    pub fn validate_with(&self, min_password_len: usize) -> Result<Registration, ValidationError> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.phone,
            &self.password,
            &self.confirm_password,
        ];
        if required.iter().any(|field| blank(field)) {
            return Err(ValidationError::MissingFields);
        }

        let email = self.email.trim();
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
        if !is_valid_phone(&self.phone) {
            return Err(ValidationError::InvalidPhone);
        }
        if self.password.chars().count() < min_password_len {
            return Err(ValidationError::PasswordTooShort {
                min: min_password_len,
            });
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !self.accepted_terms {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok(Registration {
            email: email.to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: optional(&self.address),
            city: optional(&self.city),
            postal_code: optional(&self.postal_code),
        })
    }
}

/// Login form: both fields required, nothing else is checked client-side.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, String), ValidationError> {
        if blank(&self.email) || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok((self.email.trim().to_string(), self.password.clone()))
    }
}

/// Password recovery form.
pub fn validate_recovery_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Jeanne".to_string(),
            last_name: "Martin".to_string(),
            email: "jeanne@example.com".to_string(),
            phone: "06 12 34 56 78".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            address: "".to_string(),
            city: " Paris ".to_string(),
            postal_code: String::new(),
            accepted_terms: true,
        }
    }

    #[test]
    fn test_valid_registration() {
        let reg = valid_form().validate().unwrap();
        assert_eq!(reg.email, "jeanne@example.com");
        assert_eq!(reg.address, None);
        assert_eq!(reg.city.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_missing_fields_checked_first() {
        let mut form = valid_form();
        form.last_name = "   ".to_string();
        form.email = "not-an-email".to_string();
        assert_eq!(form.validate(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_invalid_email() {
        for email in ["jeanne@example", "jeanne example@x.fr", "@example.com"] {
            let mut form = valid_form();
            form.email = email.to_string();
            assert_eq!(form.validate(), Err(ValidationError::InvalidEmail), "{email}");
        }
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("+33 (0)6-12-34-56-78"));
        assert!(is_valid_phone("06 12 34 56 78"));
        assert!(!is_valid_phone("06 12 34"));
        assert!(!is_valid_phone("06123456ab"));
    }

    #[test]
    fn test_password_rules() {
        let mut form = valid_form();
        form.password = "abc".to_string();
        form.confirm_password = "abc".to_string();
        assert_eq!(
            form.validate(),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );

        let mut form = valid_form();
        form.confirm_password = "secret2".to_string();
        assert_eq!(form.validate(), Err(ValidationError::PasswordMismatch));

        let mut form = valid_form();
        form.password = "abcdefgh".to_string();
        form.confirm_password = "abcdefgh".to_string();
        assert!(form.validate_with(10).is_err());
    }

    #[test]
    fn test_terms_required() {
        let mut form = valid_form();
        form.accepted_terms = false;
        assert_eq!(form.validate(), Err(ValidationError::TermsNotAccepted));
        assert_eq!(
            ValidationError::TermsNotAccepted.message(),
            "Vous devez accepter les conditions d'utilisation"
        );
    }

    #[test]
    fn test_login_and_recovery() {
        let form = LoginForm {
            email: " x@example.com ".to_string(),
            password: String::new(),
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingFields));

        assert_eq!(validate_recovery_email(""), Err(ValidationError::MissingEmail));
        assert_eq!(
            validate_recovery_email("nouser"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_recovery_email(" nouser@example.com").unwrap(),
            "nouser@example.com"
        );
    }
}
