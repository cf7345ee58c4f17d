use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check endpoint for the service and its NATS connection.
///
/// A failing NATS probe degrades the `nats` field but never the endpoint
/// itself.
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let mut health = json!({ "status": "UP" });

    match state.nats.health_check().await {
        Ok(()) => {
            health["nats"] = json!("UP");
        }
        Err(e) => {
            tracing::warn!(error = %e, "NATS health check failed");
            health["nats"] = json!("DOWN");
            health["error"] = json!(e.to_string());
        }
    }

    Json(health)
}
