//! User domain models.
//!
//! A [`User`] is the in-memory merge of what the identity provider knows
//! ([`AuthUser`]) and the per-user profile record ([`UserProfile`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;

/// Authenticated user as seen by screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque id issued by the identity provider.
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    /// False when no profile record exists for this account.
    pub has_profile: bool,
}

impl User {
    /// Merges provider identity with the stored profile.
    ///
    /// Profile fields win over provider defaults where both are present.
    pub fn merge(auth: &AuthUser, profile: Option<&UserProfile>) -> Self {
        let mut user = Self {
            id: auth.uid.clone(),
            email: auth.email.clone(),
            display_name: auth.display_name.clone(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            has_profile: false,
        };

        if let Some(profile) = profile {
            if !profile.email.is_empty() {
                user.email = profile.email.clone();
            }
            user.first_name = profile.first_name.clone();
            user.last_name = profile.last_name.clone();
            user.phone = profile.phone.clone();
            user.address = profile.address.clone();
            user.city = profile.city.clone();
            user.postal_code = profile.postal_code.clone();
            user.has_profile = true;
            if user.display_name.as_deref().is_none_or(str::is_empty) {
                let full = profile.full_name();
                if !full.is_empty() {
                    user.display_name = Some(full);
                }
            }
        }

        user
    }

    /// "First Last", falling back to the display name, then the email.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        if !full.is_empty() {
            return full;
        }
        self.display_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.email.clone())
    }
}

/// Profile record stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Builds the initial profile written right after account creation.
    pub fn from_registration(uid: impl Into<String>, reg: &Registration, now: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            email: reg.email.clone(),
            first_name: reg.first_name.clone(),
            last_name: reg.last_name.clone(),
            phone: reg.phone.clone(),
            address: reg.address.clone().unwrap_or_default(),
            city: reg.city.clone().unwrap_or_default(),
            postal_code: reg.postal_code.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Validated registration input.
///
/// Produced by [`super::RegistrationForm::validate`].
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl Registration {
    /// Display name pushed to the identity provider.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("city", &self.city)
            .field("postal_code", &self.postal_code)
            .finish()
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when the provider display name has to follow this update.
    pub fn changes_name(&self) -> bool {
        self.first_name.is_some() || self.last_name.is_some()
    }

    /// Applies the update in place and stamps `updated_at`.
    pub fn apply_to(&self, profile: &mut UserProfile, now: DateTime<Utc>) {
        let fields = [
            (&self.first_name, &mut profile.first_name),
            (&self.last_name, &mut profile.last_name),
            (&self.phone, &mut profile.phone),
            (&self.address, &mut profile.address),
            (&self.city, &mut profile.city),
            (&self.postal_code, &mut profile.postal_code),
        ];
        for (update, target) in fields {
            if let Some(value) = update {
                *target = value.clone();
            }
        }
        profile.updated_at = now;
    }
}
