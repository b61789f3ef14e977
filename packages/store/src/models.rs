//! # Data models exchanged with the backend
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Session`] | The signed-in identity mirrored from the credential service. Read-only on the client. |
//! | [`Document`] | One document of a collection: its id plus schemaless [`Fields`]. |
//! | [`Query`] | A single field-equality filter over a collection (`uid == <session id>`). |
//! | [`ProfileRecord`] | Typed view of a `usuarios` document. Field names on the wire are Spanish (`nombre`, `correo`, `edad`, `especialidad`, `fechaRegistro`, `fechaActualizacion`). |
//!
//! Documents stay schemaless at the store boundary so partial updates can carry
//! exactly the fields being changed; [`ProfileRecord::from_fields`] and
//! [`ProfileRecord::to_fields`] convert at the edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Collection holding one profile document per user.
pub const PROFILES_COLLECTION: &str = "usuarios";

/// Wire names of the profile document fields.
pub mod fields {
    pub const UID: &str = "uid";
    pub const NAME: &str = "nombre";
    pub const EMAIL: &str = "correo";
    pub const AGE: &str = "edad";
    pub const SPECIALTY: &str = "especialidad";
    pub const REGISTERED_AT: &str = "fechaRegistro";
    pub const UPDATED_AT: &str = "fechaActualizacion";
}

/// Schemaless document body.
pub type Fields = serde_json::Map<String, Value>;

/// Authenticated identity issued by the credential service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
            email_verified: false,
            created_at: None,
            last_sign_in_at: None,
        }
    }

    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// A stored document and its identifier within the collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Field-equality query over one collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub collection: String,
    pub field: String,
    pub value: Value,
}

impl Query {
    pub fn eq(collection: &str, field: &str, value: impl Into<Value>) -> Self {
        Self {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// The per-user profile document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub uid: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "correo", default)]
    pub email: String,
    /// Free-text numeric string, e.g. `"30"`. Stored numbers are read as text.
    #[serde(rename = "edad", default, deserialize_with = "string_or_number")]
    pub age: String,
    #[serde(rename = "especialidad", default)]
    pub specialty: String,
    #[serde(rename = "fechaRegistro", default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<String>,
    #[serde(rename = "fechaActualizacion", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, found {other}"
        ))),
    }
}

impl ProfileRecord {
    pub fn from_fields(fields: &Fields) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(fields.clone()))
    }

    pub fn to_fields(&self) -> Fields {
        let mut out = Fields::new();
        out.insert(fields::UID.into(), Value::from(self.uid.as_str()));
        out.insert(fields::NAME.into(), Value::from(self.name.as_str()));
        out.insert(fields::EMAIL.into(), Value::from(self.email.as_str()));
        out.insert(fields::AGE.into(), Value::from(self.age.as_str()));
        out.insert(fields::SPECIALTY.into(), Value::from(self.specialty.as_str()));
        if let Some(ts) = &self.registered_at {
            out.insert(fields::REGISTERED_AT.into(), Value::from(ts.as_str()));
        }
        if let Some(ts) = &self.updated_at {
            out.insert(fields::UPDATED_AT.into(), Value::from(ts.as_str()));
        }
        out
    }
}

/// Current time as an ISO-8601 string with millisecond precision, the format
/// stored in `fechaRegistro` / `fechaActualizacion`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_from_wire_fields() {
        let Value::Object(map) = json!({
            "uid": "u1",
            "nombre": "Ana",
            "correo": "ana@x.com",
            "edad": "30",
            "especialidad": "Doctor",
            "fechaRegistro": "2024-01-01T00:00:00.000Z"
        }) else {
            unreachable!()
        };

        let record = ProfileRecord::from_fields(&map).unwrap();
        assert_eq!(record.name, "Ana");
        assert_eq!(record.age, "30");
        assert_eq!(record.registered_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert!(record.updated_at.is_none());
    }

    #[test]
    fn test_profile_missing_fields_default_to_empty() {
        let Value::Object(map) = json!({ "uid": "u1" }) else {
            unreachable!()
        };
        let record = ProfileRecord::from_fields(&map).unwrap();
        assert_eq!(record.uid, "u1");
        assert!(record.specialty.is_empty());
    }

    #[test]
    fn test_to_fields_omits_unset_timestamps() {
        let record = ProfileRecord {
            uid: "u1".into(),
            name: "Ana".into(),
            ..Default::default()
        };
        let map = record.to_fields();
        assert_eq!(map.get(fields::NAME), Some(&json!("Ana")));
        assert!(!map.contains_key(fields::REGISTERED_AT));
        assert!(!map.contains_key(fields::UPDATED_AT));
    }

    #[test]
    fn test_query_matches_on_equality() {
        let query = Query::eq(PROFILES_COLLECTION, fields::UID, "u1");
        let Value::Object(hit) = json!({ "uid": "u1" }) else { unreachable!() };
        let Value::Object(miss) = json!({ "uid": "u2" }) else { unreachable!() };
        assert!(query.matches(&hit));
        assert!(!query.matches(&miss));
    }

    #[test]
    fn test_session_display_name_falls_back_to_email() {
        let mut session = Session::new("u1", "ana@x.com");
        assert_eq!(session.display_name(), "ana@x.com");
        session.display_name = Some("Ana".into());
        assert_eq!(session.display_name(), "Ana");
    }

    #[test]
    fn test_numeric_age_reads_as_text() {
        let Value::Object(map) = json!({ "uid": "u1", "nombre": "Ana", "edad": 30 }) else {
            unreachable!()
        };
        let record = ProfileRecord::from_fields(&map).unwrap();
        assert_eq!(record.age, "30");
        assert_eq!(record.name, "Ana");

        let Value::Object(map) = json!({ "uid": "u1", "edad": [30] }) else {
            unreachable!()
        };
        assert!(ProfileRecord::from_fields(&map).is_err());
    }
}
