//! Generic resource handlers.
//!
//! One set of core operations, parameterized by the entity descriptor in
//! `models::schema`, backs every route; the per-entity functions below are
//! thin wrappers that fix the kind for axum's router.
//!
//! Validation order on create is fixed: body-presence, then required fields,
//! then parent existence, then referenced-owner existence.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use models::record::Record;
use models::schema::EntityKind;

use crate::errors::ApiError;
use crate::routes::ServerState;

type JsonBody = Result<Json<Value>, JsonRejection>;

/// The body must parse as a non-empty JSON object.
fn object_body(payload: JsonBody) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(Value::Object(map))) if !map.is_empty() => Ok(map),
        _ => Err(ApiError::bad_request("Not a JSON")),
    }
}

/// Malformed ids behave like ids that resolve to nothing.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found())
}

async fn lookup(state: &ServerState, kind: EntityKind, raw_id: &str) -> Result<Record, ApiError> {
    let id = parse_id(raw_id)?;
    state.storage.get(kind, id).await?.ok_or_else(ApiError::not_found)
}

async fn list(state: &ServerState, kind: EntityKind) -> Result<Json<Value>, ApiError> {
    let objs = state.storage.all(Some(kind)).await?;
    let items: Vec<Value> = objs.values().map(Record::to_json).collect();
    Ok(Json(Value::Array(items)))
}

/// List a nested collection, filtered by the parent-reference field.
async fn list_children(
    state: &ServerState,
    kind: EntityKind,
    raw_parent_id: &str,
) -> Result<Json<Value>, ApiError> {
    let desc = kind.descriptor();
    let parent = desc.parent.ok_or_else(ApiError::not_found)?;
    let parent_rec = lookup(state, parent.kind, raw_parent_id).await?;
    let parent_id = parent_rec.id.to_string();

    let objs = state.storage.all(Some(kind)).await?;
    let items: Vec<Value> = objs
        .values()
        .filter(|rec| rec.attr_str(parent.field) == Some(parent_id.as_str()))
        .map(Record::to_json)
        .collect();
    Ok(Json(Value::Array(items)))
}

async fn fetch(state: &ServerState, kind: EntityKind, raw_id: &str) -> Result<Json<Value>, ApiError> {
    let record = lookup(state, kind, raw_id).await?;
    Ok(Json(record.to_json()))
}

async fn create(
    state: &ServerState,
    kind: EntityKind,
    raw_parent_id: Option<&str>,
    payload: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let desc = kind.descriptor();
    let body = object_body(payload)?;

    for field in desc.required_fields() {
        if !body.contains_key(field.name) {
            return Err(ApiError::bad_request(format!("Missing {}", field.name)));
        }
    }

    let mut attrs = Map::new();

    // the parent named in the path must exist; the path value wins over
    // anything the body may claim
    if let Some(parent) = desc.parent {
        let raw = raw_parent_id.ok_or_else(ApiError::not_found)?;
        let parent_rec = lookup(state, parent.kind, raw).await?;
        attrs.insert(parent.field.to_string(), Value::String(parent_rec.id.to_string()));
    }

    // a referenced owner must exist; a non-id value resolves to nothing
    if let Some(owner) = desc.owner {
        let raw = body.get(owner.field).and_then(Value::as_str).unwrap_or_default();
        lookup(state, owner.kind, raw).await?;
    }

    for field in desc.fields {
        if desc.parent.is_some_and(|p| p.field == field.name) {
            continue;
        }
        if let Some(value) = body.get(field.name) {
            attrs.insert(field.name.to_string(), field.coerce(value)?);
        }
    }

    let record = Record::create(kind, attrs);
    state.storage.new(record.clone()).await?;
    state.storage.save().await?;
    Ok((StatusCode::CREATED, Json(record.to_json())))
}

async fn update(
    state: &ServerState,
    kind: EntityKind,
    raw_id: &str,
    payload: JsonBody,
) -> Result<Json<Value>, ApiError> {
    let desc = kind.descriptor();
    let mut record = lookup(state, kind, raw_id).await?;
    let body = object_body(payload)?;

    // the schema is authoritative: unknown keys and values for immutable
    // fields (id, timestamps, relationship owners) are silently discarded
    for (key, value) in &body {
        let Some(field) = desc.field(key) else { continue };
        if !field.mutable {
            continue;
        }
        record.attrs.insert(key.clone(), field.coerce(value)?);
    }

    state.storage.new(record.clone()).await?;
    state.storage.save().await?;
    Ok(Json(record.to_json()))
}

async fn remove(state: &ServerState, kind: EntityKind, raw_id: &str) -> Result<Json<Value>, ApiError> {
    let record = lookup(state, kind, raw_id).await?;
    state.storage.delete(&record).await?;
    state.storage.save().await?;
    Ok(Json(json!({})))
}

// ---- states ----

pub async fn list_states(State(state): State<ServerState>) -> Result<Json<Value>, ApiError> {
    list(&state, EntityKind::State).await
}

pub async fn create_state(
    State(state): State<ServerState>,
    payload: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create(&state, EntityKind::State, None, payload).await
}

pub async fn get_state(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, EntityKind::State, &id).await
}

pub async fn update_state(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Json<Value>, ApiError> {
    update(&state, EntityKind::State, &id, payload).await
}

pub async fn delete_state(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, EntityKind::State, &id).await
}

// ---- cities (nested under states) ----

pub async fn list_cities(
    State(state): State<ServerState>,
    Path(state_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    list_children(&state, EntityKind::City, &state_id).await
}

pub async fn create_city(
    State(state): State<ServerState>,
    Path(state_id): Path<String>,
    payload: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create(&state, EntityKind::City, Some(&state_id), payload).await
}

pub async fn get_city(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, EntityKind::City, &id).await
}

pub async fn update_city(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Json<Value>, ApiError> {
    update(&state, EntityKind::City, &id, payload).await
}

pub async fn delete_city(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, EntityKind::City, &id).await
}

// ---- amenities ----

pub async fn list_amenities(State(state): State<ServerState>) -> Result<Json<Value>, ApiError> {
    list(&state, EntityKind::Amenity).await
}

pub async fn create_amenity(
    State(state): State<ServerState>,
    payload: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create(&state, EntityKind::Amenity, None, payload).await
}

pub async fn get_amenity(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, EntityKind::Amenity, &id).await
}

pub async fn update_amenity(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Json<Value>, ApiError> {
    update(&state, EntityKind::Amenity, &id, payload).await
}

pub async fn delete_amenity(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, EntityKind::Amenity, &id).await
}

// ---- users ----

pub async fn list_users(State(state): State<ServerState>) -> Result<Json<Value>, ApiError> {
    list(&state, EntityKind::User).await
}

pub async fn create_user(
    State(state): State<ServerState>,
    payload: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create(&state, EntityKind::User, None, payload).await
}

pub async fn get_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, EntityKind::User, &id).await
}

pub async fn update_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Json<Value>, ApiError> {
    update(&state, EntityKind::User, &id, payload).await
}

pub async fn delete_user(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, EntityKind::User, &id).await
}

// ---- places (nested under cities) ----

pub async fn list_places(
    State(state): State<ServerState>,
    Path(city_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    list_children(&state, EntityKind::Place, &city_id).await
}

pub async fn create_place(
    State(state): State<ServerState>,
    Path(city_id): Path<String>,
    payload: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create(&state, EntityKind::Place, Some(&city_id), payload).await
}

pub async fn get_place(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, EntityKind::Place, &id).await
}

pub async fn update_place(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Json<Value>, ApiError> {
    update(&state, EntityKind::Place, &id, payload).await
}

pub async fn delete_place(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, EntityKind::Place, &id).await
}

// ---- reviews (nested under places) ----

pub async fn list_reviews(
    State(state): State<ServerState>,
    Path(place_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    list_children(&state, EntityKind::Review, &place_id).await
}

pub async fn create_review(
    State(state): State<ServerState>,
    Path(place_id): Path<String>,
    payload: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    create(&state, EntityKind::Review, Some(&place_id), payload).await
}

pub async fn get_review(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    fetch(&state, EntityKind::Review, &id).await
}

pub async fn update_review(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: JsonBody,
) -> Result<Json<Value>, ApiError> {
    update(&state, EntityKind::Review, &id, payload).await
}

pub async fn delete_review(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    remove(&state, EntityKind::Review, &id).await
}
