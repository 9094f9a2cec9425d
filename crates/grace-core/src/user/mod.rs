//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: User, profile record and registration input
//! - `validation`: client-side form validation
//! - `repository`: profile persistence port

mod model;
mod repository;
mod validation;

pub use model::{ProfileUpdate, Registration, User, UserProfile};
pub use repository::ProfileRepository;
pub use validation::{
    DEFAULT_MIN_PASSWORD_LEN, LoginForm, RegistrationForm, ValidationError, is_valid_email,
    is_valid_phone, validate_recovery_email,
};
