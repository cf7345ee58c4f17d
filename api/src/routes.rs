use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/events/status",
            post(handlers::events::update_event_status),
        )
        .route("/events", get(handlers::events::list_events))
        .route("/health", get(handlers::health::health_check))
        .route(
            "/mock-api/events/:event_id",
            get(handlers::mock_api::get_event_data),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
