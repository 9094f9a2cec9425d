//! Dossier domain model.
//!
//! A dossier is one insurance matter owned by a single user and always
//! addressed as `(user_id, dossier_id)`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of insurance a dossier is about.
///
/// Unknown stored values read back as [`DossierType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DossierType {
    Auto,
    Habitation,
    Sante,
    Vie,
    Pro,
    Voyage,
    #[serde(other)]
    Other,
}

impl DossierType {
    pub const ALL: [DossierType; 7] = [
        DossierType::Auto,
        DossierType::Habitation,
        DossierType::Sante,
        DossierType::Vie,
        DossierType::Pro,
        DossierType::Voyage,
        DossierType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DossierType::Auto => "auto",
            DossierType::Habitation => "habitation",
            DossierType::Sante => "sante",
            DossierType::Vie => "vie",
            DossierType::Pro => "pro",
            DossierType::Voyage => "voyage",
            DossierType::Other => "other",
        }
    }

    /// Human label used in titles ("Assurance Santé").
    pub fn label(self) -> &'static str {
        match self {
            DossierType::Auto => "Auto",
            DossierType::Habitation => "Habitation",
            DossierType::Sante => "Santé",
            DossierType::Vie => "Vie",
            DossierType::Pro => "Professionnelle",
            DossierType::Voyage => "Voyage",
            DossierType::Other => "Autre",
        }
    }

    /// Parses a stored value, mapping anything unknown to `Other`.
    pub fn parse_lossy(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .unwrap_or(DossierType::Other)
    }
}

impl fmt::Display for DossierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DossierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown dossier type '{}'", s))
    }
}

/// Processing status of a dossier.
///
/// The access layer does not validate statuses on update, so any stored
/// string is preserved verbatim in [`DossierStatus::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DossierStatus {
    EnCours,
    Termine,
    Valide,
    EnAttente,
    Unrecognized(String),
}

impl DossierStatus {
    pub const KNOWN: [DossierStatus; 4] = [
        DossierStatus::EnCours,
        DossierStatus::Termine,
        DossierStatus::Valide,
        DossierStatus::EnAttente,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            DossierStatus::EnCours => "En cours",
            DossierStatus::Termine => "Terminé",
            DossierStatus::Valide => "Validé",
            DossierStatus::EnAttente => "En attente",
            DossierStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, DossierStatus::Unrecognized(_))
    }
}

impl From<String> for DossierStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "En cours" => DossierStatus::EnCours,
            "Terminé" => DossierStatus::Termine,
            "Validé" => DossierStatus::Valide,
            "En attente" => DossierStatus::EnAttente,
            _ => DossierStatus::Unrecognized(value),
        }
    }
}

impl From<&str> for DossierStatus {
    fn from(value: &str) -> Self {
        DossierStatus::from(value.to_string())
    }
}

impl From<DossierStatus> for String {
    fn from(status: DossierStatus) -> Self {
        match status {
            DossierStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DossierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insurance case folder stored at `users/{user_id}/dossiers/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dossier {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub dossier_type: DossierType,
    pub status: DossierStatus,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub documents_count: u32,
}

/// Caller-supplied fields for a new dossier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDossier {
    pub title: String,
    #[serde(rename = "type")]
    pub dossier_type: DossierType,
    #[serde(default)]
    pub description: String,
}

impl NewDossier {
    pub fn new(title: impl Into<String>, dossier_type: DossierType) -> Self {
        Self {
            title: title.into(),
            dossier_type,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Canonical dossier offered by the "new dossier" picker.
    pub fn for_type(dossier_type: DossierType) -> Self {
        Self {
            title: format!("Dossier d'Assurance {}", dossier_type.label()),
            dossier_type,
            description: format!("Dossier d'assurance {}", dossier_type.as_str()),
        }
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dossier_type: Option<DossierType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DossierStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_count: Option<u32>,
}

impl DossierPatch {
    pub fn status(status: impl Into<DossierStatus>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the patch into `dossier` and sets `updated_at`.
    pub fn apply_to(&self, dossier: &mut Dossier, updated_at: DateTime<Utc>) {
        if let Some(title) = &self.title {
            dossier.title = title.clone();
        }
        if let Some(dossier_type) = self.dossier_type {
            dossier.dossier_type = dossier_type;
        }
        if let Some(status) = &self.status {
            dossier.status = status.clone();
        }
        if let Some(description) = &self.description {
            dossier.description = description.clone();
        }
        if let Some(count) = self.documents_count {
            dossier.documents_count = count;
        }
        dossier.updated_at = updated_at;
    }
}

/// PDF attached to a dossier.
///
/// Listed by screens but not persisted anywhere yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub size: u64,
    pub date: DateTime<Utc>,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(DossierStatus::from("Validé"), DossierStatus::Valide);
        assert_eq!(String::from(DossierStatus::EnCours), "En cours");
        let odd = DossierStatus::from("Archivé");
        assert!(!odd.is_recognized());
        assert_eq!(odd.as_str(), "Archivé");
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&DossierStatus::EnAttente).unwrap();
        assert_eq!(json, "\"En attente\"");
        let parsed: DossierStatus = serde_json::from_str("\"n'importe quoi\"").unwrap();
        assert_eq!(parsed, DossierStatus::Unrecognized("n'importe quoi".to_string()));
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("sante".parse::<DossierType>().unwrap(), DossierType::Sante);
        assert!("bateau".parse::<DossierType>().is_err());
        assert_eq!(DossierType::parse_lossy("bateau"), DossierType::Other);
        let parsed: DossierType = serde_json::from_str("\"bateau\"").unwrap();
        assert_eq!(parsed, DossierType::Other);
    }

    #[test]
    fn test_new_dossier_for_type() {
        let new = NewDossier::for_type(DossierType::Auto);
        assert_eq!(new.title, "Dossier d'Assurance Auto");
        assert_eq!(new.description, "Dossier d'assurance auto");
        let new = NewDossier::for_type(DossierType::Sante);
        assert_eq!(new.title, "Dossier d'Assurance Santé");
    }

    #[test]
    fn test_patch_apply() {
        let now = Utc::now();
        let mut dossier = Dossier {
            id: "DOS-1".to_string(),
            user_id: "u1".to_string(),
            title: "Auto".to_string(),
            dossier_type: DossierType::Auto,
            status: DossierStatus::EnCours,
            description: String::new(),
            created_at: now,
            updated_at: now,
            documents_count: 0,
        };
        let later = now + chrono::Duration::milliseconds(5);
        DossierPatch::status("Validé").apply_to(&mut dossier, later);
        assert_eq!(dossier.status, DossierStatus::Valide);
        assert_eq!(dossier.title, "Auto");
        assert_eq!(dossier.updated_at, later);
    }

    #[test]
    fn test_dossier_json_shape() {
        let now = Utc::now();
        let dossier = Dossier {
            id: "DOS-1".to_string(),
            user_id: "u1".to_string(),
            title: "Auto".to_string(),
            dossier_type: DossierType::Auto,
            status: DossierStatus::EnCours,
            description: String::new(),
            created_at: now,
            updated_at: now,
            documents_count: 0,
        };
        let value = serde_json::to_value(&dossier).unwrap();
        assert_eq!(value["type"], "auto");
        assert_eq!(value["status"], "En cours");
        assert_eq!(value["documentsCount"], 0);
    }
}
