// Data model for tracked events and published updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of one tracked event as held by the registry.
///
/// Created on first activation and never removed; a deactivated event stays
/// queryable with `live == false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    pub event_id: String,
    pub live: bool,
    pub current_score: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl TrackedEvent {
    /// A freshly activated event with no observed score yet.
    pub fn new_live(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            live: true,
            current_score: None,
            last_updated: Utc::now(),
        }
    }
}

/// Result of one fetch against the external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedEvent {
    pub event_id: String,
    pub current_score: String,
}

/// Payload shipped downstream after a successful fetch.
///
/// Immutable once constructed; not retained after hand-off to the publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub event_id: String,
    pub live: bool,
    pub current_score: String,
    pub fetched_at: DateTime<Utc>,
}
