//! Backend-neutral entity representation.
//!
//! Both storage backends traffic in [`Record`]s: the file backend serializes
//! them directly into its snapshot, the database backend converts them to and
//! from the typed sea-orm models via [`from_model`] / [`to_model`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::schema::EntityKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub kind: EntityKind,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only attributes actually set; unsupplied optional fields are absent.
    #[serde(default)]
    pub attrs: Map<String, Value>,
}

impl Record {
    pub fn create(kind: EntityKind, attrs: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self { kind, id: Uuid::new_v4(), created_at: now, updated_at: now, attrs }
    }

    /// Composite key used by the storage layer: `"<Kind>.<id>"`.
    pub fn storage_key(&self) -> String {
        storage_key(self.kind, self.id)
    }

    /// Flat wire representation: every set attribute plus `id`, `created_at`
    /// and `updated_at`.
    pub fn to_json(&self) -> Value {
        let mut map = self.attrs.clone();
        map.insert("id".into(), Value::String(self.id.to_string()));
        map.insert("created_at".into(), Value::String(self.created_at.to_rfc3339()));
        map.insert("updated_at".into(), Value::String(self.updated_at.to_rfc3339()));
        Value::Object(map)
    }

    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Value::as_str)
    }
}

pub fn storage_key(kind: EntityKind, id: Uuid) -> String {
    format!("{}.{}", kind.name(), id)
}

/// Convert a typed sea-orm model into a record. Null columns are dropped so
/// the record carries only the attributes that were actually set.
pub fn from_model<M: Serialize>(kind: EntityKind, model: &M) -> Result<Record, ModelError> {
    let value = serde_json::to_value(model).map_err(|e| ModelError::Serde(e.to_string()))?;
    let Value::Object(mut map) = value else {
        return Err(ModelError::Serde(format!("{} model is not an object", kind.name())));
    };
    let id = take_uuid(&mut map, "id")?;
    let created_at = take_datetime(&mut map, "created_at")?;
    let updated_at = take_datetime(&mut map, "updated_at")?;
    map.retain(|_, v| !v.is_null());
    Ok(Record { kind, id, created_at, updated_at, attrs: map })
}

/// Rehydrate a typed sea-orm model from a record.
pub fn to_model<M: DeserializeOwned>(record: &Record) -> Result<M, ModelError> {
    serde_json::from_value(record.to_json()).map_err(|e| ModelError::Serde(e.to_string()))
}

fn take_uuid(map: &mut Map<String, Value>, key: &str) -> Result<Uuid, ModelError> {
    map.remove(key)
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ModelError::Serde(format!("missing or invalid {key}")))
}

fn take_datetime(map: &mut Map<String, Value>, key: &str) -> Result<DateTime<Utc>, ModelError> {
    map.remove(key)
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ModelError::Serde(format!("missing or invalid {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{place, state};
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn create_assigns_id_and_equal_timestamps() {
        let rec = Record::create(EntityKind::State, attrs(&[("name", json!("Nevada"))]));
        assert_eq!(rec.created_at, rec.updated_at);
        assert_eq!(rec.storage_key(), format!("State.{}", rec.id));
    }

    #[test]
    fn to_json_is_flat_and_complete() {
        let rec = Record::create(EntityKind::State, attrs(&[("name", json!("Nevada"))]));
        let json = rec.to_json();
        assert_eq!(json["name"], "Nevada");
        assert_eq!(json["id"], rec.id.to_string());
        assert!(json["created_at"].is_string());
        assert!(json["updated_at"].is_string());
    }

    #[test]
    fn state_model_round_trips() {
        let now = Utc::now();
        let model = state::Model {
            id: Uuid::new_v4(),
            name: "Oregon".into(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        let rec = from_model(EntityKind::State, &model).unwrap();
        assert_eq!(rec.id, model.id);
        assert_eq!(rec.attr_str("name"), Some("Oregon"));
        assert!(!rec.attrs.contains_key("id"));

        let back: state::Model = to_model(&rec).unwrap();
        assert_eq!(back.id, model.id);
        assert_eq!(back.name, model.name);
    }

    #[test]
    fn null_columns_are_dropped() {
        let now = Utc::now();
        let model = place::Model {
            id: Uuid::new_v4(),
            city_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Cabin".into(),
            description: None,
            number_rooms: Some(2),
            number_bathrooms: None,
            max_guest: None,
            price_by_night: None,
            latitude: None,
            longitude: None,
            amenity_ids: None,
            created_at: now.into(),
            updated_at: now.into(),
        };
        let rec = from_model(EntityKind::Place, &model).unwrap();
        assert_eq!(rec.attrs.get("number_rooms"), Some(&json!(2)));
        assert!(!rec.attrs.contains_key("description"));
        assert!(!rec.attrs.contains_key("latitude"));
    }

    #[test]
    fn partial_record_rehydrates_with_none_columns() {
        let rec = Record::create(
            EntityKind::Place,
            attrs(&[
                ("city_id", json!(Uuid::new_v4().to_string())),
                ("user_id", json!(Uuid::new_v4().to_string())),
                ("name", json!("Loft")),
            ]),
        );
        let model: place::Model = to_model(&rec).unwrap();
        assert_eq!(model.name, "Loft");
        assert_eq!(model.description, None);
        assert_eq!(model.number_rooms, None);
    }
}
