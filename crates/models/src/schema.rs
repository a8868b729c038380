//! Static per-entity-type field schema.
//!
//! Handlers consult this registry instead of assigning arbitrary request keys:
//! create pulls required/optional fields from it, update applies only fields
//! marked mutable. Identifier and timestamps are not listed here; they are
//! managed by [`crate::record::Record`] and never client-writable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ModelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    State,
    City,
    Amenity,
    User,
    Place,
    Review,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    /// JSON array of id strings.
    IdList,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    /// Must be present in a create body (parent fields are path-supplied
    /// instead and are never marked required).
    pub required: bool,
    /// Fields not marked mutable are silently discarded by update.
    pub mutable: bool,
}

/// A reference from this entity type to another one, stored under `field`.
#[derive(Clone, Copy, Debug)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub field: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub name: &'static str,
    pub plural: &'static str,
    /// Nesting parent; its id comes from the route path on create/list.
    pub parent: Option<EntityRef>,
    /// Owning user reference; its id comes from the body and must resolve.
    pub owner: Option<EntityRef>,
    pub fields: &'static [FieldSpec],
}

const fn text(name: &'static str, required: bool, mutable: bool) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Text, required, mutable }
}

const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Integer, required: false, mutable: true }
}

const fn float(name: &'static str) -> FieldSpec {
    FieldSpec { name, ty: FieldType::Float, required: false, mutable: true }
}

static STATE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::State,
    name: "State",
    plural: "states",
    parent: None,
    owner: None,
    fields: &[text("name", true, true)],
};

static CITY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::City,
    name: "City",
    plural: "cities",
    parent: Some(EntityRef { kind: EntityKind::State, field: "state_id" }),
    owner: None,
    fields: &[text("state_id", false, false), text("name", true, true)],
};

static AMENITY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Amenity,
    name: "Amenity",
    plural: "amenities",
    parent: None,
    owner: None,
    fields: &[text("name", true, true)],
};

static USER: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::User,
    name: "User",
    plural: "users",
    parent: None,
    owner: None,
    fields: &[
        text("email", true, true),
        text("password", true, true),
        text("first_name", false, true),
        text("last_name", false, true),
    ],
};

static PLACE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Place,
    name: "Place",
    plural: "places",
    parent: Some(EntityRef { kind: EntityKind::City, field: "city_id" }),
    owner: Some(EntityRef { kind: EntityKind::User, field: "user_id" }),
    fields: &[
        text("city_id", false, false),
        text("user_id", true, false),
        text("name", true, true),
        text("description", false, true),
        integer("number_rooms"),
        integer("number_bathrooms"),
        integer("max_guest"),
        integer("price_by_night"),
        float("latitude"),
        float("longitude"),
        FieldSpec { name: "amenity_ids", ty: FieldType::IdList, required: false, mutable: true },
    ],
};

static REVIEW: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Review,
    name: "Review",
    plural: "reviews",
    parent: Some(EntityRef { kind: EntityKind::Place, field: "place_id" }),
    owner: Some(EntityRef { kind: EntityKind::User, field: "user_id" }),
    fields: &[
        text("place_id", false, false),
        text("user_id", true, false),
        text("text", true, true),
    ],
};

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::State,
        EntityKind::City,
        EntityKind::Amenity,
        EntityKind::User,
        EntityKind::Place,
        EntityKind::Review,
    ];

    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            EntityKind::State => &STATE,
            EntityKind::City => &CITY,
            EntityKind::Amenity => &AMENITY,
            EntityKind::User => &USER,
            EntityKind::Place => &PLACE,
            EntityKind::Review => &REVIEW,
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn plural(self) -> &'static str {
        self.descriptor().plural
    }
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Required create-body fields, in declaration order (drives the order of
    /// `Missing <field>` messages).
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

impl FieldSpec {
    /// Check an incoming JSON value against the declared type, returning the
    /// value to store. Integers must be whole numbers fitting i32; floats
    /// accept integer literals.
    pub fn coerce(&self, value: &Value) -> Result<Value, ModelError> {
        let invalid = || ModelError::Validation(format!("Invalid {}", self.name));
        match self.ty {
            FieldType::Text => {
                if value.is_string() {
                    Ok(value.clone())
                } else {
                    Err(invalid())
                }
            }
            FieldType::Integer => match value.as_i64() {
                Some(n) if i32::try_from(n).is_ok() => Ok(Value::from(n)),
                _ => Err(invalid()),
            },
            FieldType::Float => match value.as_f64() {
                Some(f) if f.is_finite() => Ok(Value::from(f)),
                _ => Err(invalid()),
            },
            FieldType::IdList => match value.as_array() {
                Some(items) if items.iter().all(Value::is_string) => Ok(value.clone()),
                _ => Err(invalid()),
            },
        }
    }
}
