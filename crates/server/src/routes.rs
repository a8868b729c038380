use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use service::storage::Storage;

pub mod index;
pub mod resources;

/// Shared handler state. The storage adapter is constructed once at startup
/// and injected here; handlers never reach for ambient globals.
#[derive(Clone)]
pub struct ServerState {
    pub storage: Arc<dyn Storage>,
}

/// Build the full application router under the `/api/v1` prefix.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let api = Router::new()
        .route("/status", get(index::status))
        .route("/stats", get(index::stats))
        .route("/states", get(resources::list_states).post(resources::create_state))
        .route(
            "/states/:state_id",
            get(resources::get_state)
                .put(resources::update_state)
                .delete(resources::delete_state),
        )
        .route(
            "/states/:state_id/cities",
            get(resources::list_cities).post(resources::create_city),
        )
        .route(
            "/cities/:city_id",
            get(resources::get_city).put(resources::update_city).delete(resources::delete_city),
        )
        .route("/amenities", get(resources::list_amenities).post(resources::create_amenity))
        .route(
            "/amenities/:amenity_id",
            get(resources::get_amenity)
                .put(resources::update_amenity)
                .delete(resources::delete_amenity),
        )
        .route("/users", get(resources::list_users).post(resources::create_user))
        .route(
            "/users/:user_id",
            get(resources::get_user).put(resources::update_user).delete(resources::delete_user),
        )
        .route(
            "/cities/:city_id/places",
            get(resources::list_places).post(resources::create_place),
        )
        .route(
            "/places/:place_id",
            get(resources::get_place)
                .put(resources::update_place)
                .delete(resources::delete_place),
        )
        .route(
            "/places/:place_id/reviews",
            get(resources::list_reviews).post(resources::create_review),
        )
        .route(
            "/reviews/:review_id",
            get(resources::get_review)
                .put(resources::update_review)
                .delete(resources::delete_review),
        );

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
