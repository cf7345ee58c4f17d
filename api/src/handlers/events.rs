use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use common::errors::TrackerError;
use common::models::TrackedEvent;

/// Request to activate or deactivate tracking for an event
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatusRequest {
    pub event_id: String,
    pub live: bool,
}

/// Activate or deactivate event tracking
#[tracing::instrument(skip(state, req), fields(event_id = %req.event_id, live = req.live))]
pub async fn update_event_status(
    State(state): State<AppState>,
    Json(req): Json<EventStatusRequest>,
) -> Result<StatusCode, ErrorResponse> {
    tracing::info!("received event status update");

    state
        .tracker
        .set_status(&req.event_id, req.live)
        .map_err(|e| match e {
            TrackerError::InvalidCommand(_) => ErrorResponse::new("validation_error", e.to_string()),
            TrackerError::SchedulingFailed { .. } => {
                ErrorResponse::new("scheduling_error", e.to_string())
            }
        })?;

    Ok(StatusCode::OK)
}

/// List every known event with its current tracked state
#[tracing::instrument(skip(state))]
pub async fn list_events(State(state): State<AppState>) -> Json<HashMap<String, TrackedEvent>> {
    Json(state.tracker.list_all())
}
