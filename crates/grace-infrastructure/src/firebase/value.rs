//! Firestore REST typed values and entity encoding.
//!
//! Firestore wraps every field in a typed value object
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`, ...). The encoders
//! here are explicit per entity so timestamps are written as
//! `timestampValue` rather than strings.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use grace_core::dossier::{Dossier, DossierPatch, DossierStatus, DossierType};
use grace_core::error::{GraceError, Result};
use grace_core::user::{ProfileUpdate, UserProfile};
use serde::{Deserialize, Serialize};

pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// int64 encoded as a decimal string.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    MapValue(MapValue),
    ArrayValue(ArrayValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    pub fn integer(value: i64) -> Self {
        Value::IntegerValue(value.to_string())
    }

    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Value::TimestampValue(value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(d) => Some(*d as i64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::TimestampValue(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

/// A stored document as returned by the REST API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    pub fn from_fields(fields: Fields) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    /// Last path segment of `name` (the document id).
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn string(&self, key: &str) -> String {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn required_string(&self, key: &str) -> Result<String> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| decode_error(&self.name, key))
    }

    /// Timestamp field, falling back to the document's own metadata time and
    /// finally to now, so records written by older clients still load.
    fn timestamp(&self, key: &str, metadata: Option<&String>) -> DateTime<Utc> {
        self.fields
            .get(key)
            .and_then(Value::as_timestamp)
            .or_else(|| metadata.and_then(|s| parse_timestamp(s)))
            .unwrap_or_else(Utc::now)
    }
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn decode_error(document: &str, field: &str) -> GraceError {
    GraceError::Serialization {
        format: "Firestore".to_string(),
        message: format!("document '{}' is missing field '{}'", document, field),
    }
}

// ============================================================================
// Dossier
// ============================================================================

pub fn encode_dossier(dossier: &Dossier) -> Fields {
    let mut fields = Fields::new();
    fields.insert("id".into(), Value::string(&dossier.id));
    fields.insert("userId".into(), Value::string(&dossier.user_id));
    fields.insert("title".into(), Value::string(&dossier.title));
    fields.insert("type".into(), Value::string(dossier.dossier_type.as_str()));
    fields.insert("status".into(), Value::string(dossier.status.as_str()));
    fields.insert("description".into(), Value::string(&dossier.description));
    fields.insert("createdAt".into(), Value::timestamp(dossier.created_at));
    fields.insert("updatedAt".into(), Value::timestamp(dossier.updated_at));
    fields.insert(
        "documentsCount".into(),
        Value::integer(i64::from(dossier.documents_count)),
    );
    fields
}

/// Decodes a dossier. The id comes from the document path, the owner from
/// the request scope.
pub fn decode_dossier(document: &Document, user_id: &str) -> Result<Dossier> {
    let id = match document.id() {
        "" => document.required_string("id")?,
        id => id.to_string(),
    };
    Ok(Dossier {
        id,
        user_id: user_id.to_string(),
        title: document.string("title"),
        dossier_type: DossierType::parse_lossy(&document.string("type")),
        status: DossierStatus::from(document.string("status")),
        description: document.string("description"),
        created_at: document.timestamp("createdAt", document.create_time.as_ref()),
        updated_at: document.timestamp("updatedAt", document.update_time.as_ref()),
        documents_count: document
            .fields
            .get("documentsCount")
            .and_then(Value::as_i64)
            .and_then(|count| u32::try_from(count).ok())
            .unwrap_or(0),
    })
}

/// Fields and update mask for a partial dossier update.
pub fn encode_dossier_patch(patch: &DossierPatch, updated_at: DateTime<Utc>) -> (Fields, Vec<String>) {
    let mut fields = Fields::new();
    if let Some(title) = &patch.title {
        fields.insert("title".into(), Value::string(title));
    }
    if let Some(dossier_type) = patch.dossier_type {
        fields.insert("type".into(), Value::string(dossier_type.as_str()));
    }
    if let Some(status) = &patch.status {
        fields.insert("status".into(), Value::string(status.as_str()));
    }
    if let Some(description) = &patch.description {
        fields.insert("description".into(), Value::string(description));
    }
    if let Some(count) = patch.documents_count {
        fields.insert("documentsCount".into(), Value::integer(i64::from(count)));
    }
    fields.insert("updatedAt".into(), Value::timestamp(updated_at));
    let mask = fields.keys().cloned().collect();
    (fields, mask)
}

// ============================================================================
// Profile
// ============================================================================

pub fn encode_profile(profile: &UserProfile) -> Fields {
    let mut fields = Fields::new();
    fields.insert("uid".into(), Value::string(&profile.uid));
    fields.insert("email".into(), Value::string(&profile.email));
    fields.insert("firstName".into(), Value::string(&profile.first_name));
    fields.insert("lastName".into(), Value::string(&profile.last_name));
    fields.insert("phone".into(), Value::string(&profile.phone));
    fields.insert("address".into(), Value::string(&profile.address));
    fields.insert("city".into(), Value::string(&profile.city));
    fields.insert("postalCode".into(), Value::string(&profile.postal_code));
    fields.insert("createdAt".into(), Value::timestamp(profile.created_at));
    fields.insert("updatedAt".into(), Value::timestamp(profile.updated_at));
    fields
}

pub fn decode_profile(document: &Document) -> Result<UserProfile> {
    let uid = match document.fields.get("uid").and_then(Value::as_str) {
        Some(uid) => uid.to_string(),
        None if !document.id().is_empty() => document.id().to_string(),
        None => return Err(decode_error(&document.name, "uid")),
    };
    Ok(UserProfile {
        uid,
        email: document.string("email"),
        first_name: document.string("firstName"),
        last_name: document.string("lastName"),
        phone: document.string("phone"),
        address: document.string("address"),
        city: document.string("city"),
        postal_code: document.string("postalCode"),
        created_at: document.timestamp("createdAt", document.create_time.as_ref()),
        updated_at: document.timestamp("updatedAt", document.update_time.as_ref()),
    })
}

pub fn encode_profile_update(update: &ProfileUpdate, updated_at: DateTime<Utc>) -> (Fields, Vec<String>) {
    let mut fields = Fields::new();
    let pairs = [
        ("firstName", &update.first_name),
        ("lastName", &update.last_name),
        ("phone", &update.phone),
        ("address", &update.address),
        ("city", &update.city),
        ("postalCode", &update.postal_code),
    ];
    for (key, value) in pairs {
        if let Some(value) = value {
            fields.insert(key.to_string(), Value::string(value));
        }
    }
    fields.insert("updatedAt".into(), Value::timestamp(updated_at));
    let mask = fields.keys().cloned().collect();
    (fields, mask)
}
