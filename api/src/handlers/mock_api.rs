use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::state::AppState;

/// Mock upstream endpoint serving a monotonically increasing score per
/// event. Lets the fetcher be pointed at this service itself for demos and
/// smoke tests.
#[tracing::instrument(skip(state))]
pub async fn get_event_data(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Json<HashMap<String, String>> {
    let score = {
        let mut entry = state.mock_scores.entry(event_id.clone()).or_insert(0);
        let current = *entry;
        *entry += 1;
        current
    };

    tracing::info!(event_id = %event_id, score, "mock API serving event data");

    let mut response = HashMap::new();
    response.insert("eventId".to_string(), event_id);
    response.insert("currentScore".to_string(), score.to_string());
    Json(response)
}
