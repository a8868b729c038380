use axum::{extract::State, Json};
use serde_json::{json, Value};

use common::types::ApiStatus;
use models::schema::EntityKind;

use crate::errors::ApiError;
use crate::routes::ServerState;

pub async fn status() -> Json<ApiStatus> {
    Json(ApiStatus { status: "OK" })
}

/// Per-type object counts, keyed by plural entity name.
pub async fn stats(State(state): State<ServerState>) -> Result<Json<Value>, ApiError> {
    let mut counts = serde_json::Map::new();
    for kind in EntityKind::ALL {
        let n = state.storage.count(Some(kind)).await?;
        counts.insert(kind.plural().to_string(), json!(n));
    }
    Ok(Json(Value::Object(counts)))
}
