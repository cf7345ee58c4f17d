// Concurrent registry of tracked event state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::models::TrackedEvent;

/// Per-key-atomic map of event id to tracked state.
///
/// All mutation goes through the entry API so that concurrent operations on
/// the same id serialize without a global lock; operations on distinct ids
/// never block each other. Entries are never removed: a deactivated event
/// stays queryable with `live == false`.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: DashMap<String, TrackedEvent>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry with `live = true`, or flip an existing entry live,
    /// leaving its score and timestamp untouched.
    pub fn upsert_activate(&self, event_id: &str) -> TrackedEvent {
        let entry = self
            .events
            .entry(event_id.to_string())
            .and_modify(|event| event.live = true)
            .or_insert_with(|| TrackedEvent::new_live(event_id));
        entry.clone()
    }

    /// Flip the entry's live flag off. Absent ids are a no-op; deactivation
    /// never creates an entry.
    pub fn deactivate(&self, event_id: &str) -> bool {
        match self.events.get_mut(event_id) {
            Some(mut event) => {
                event.live = false;
                true
            }
            None => {
                debug!(event_id, "deactivate for unknown event ignored");
                false
            }
        }
    }

    /// Record a successful fetch. Last write wins on `last_updated`; absent
    /// ids are a no-op.
    pub fn record_fetch_result(&self, event_id: &str, score: &str, at: DateTime<Utc>) -> bool {
        match self.events.get_mut(event_id) {
            Some(mut event) => {
                event.current_score = Some(score.to_string());
                event.last_updated = at;
                true
            }
            None => false,
        }
    }

    /// Cloned snapshot of one entry.
    pub fn get(&self, event_id: &str) -> Option<TrackedEvent> {
        self.events.get(event_id).map(|event| event.clone())
    }

    /// Point-in-time snapshot of every known event. The registry may be
    /// mutated concurrently; the snapshot is not live.
    pub fn list_all(&self) -> HashMap<String, TrackedEvent> {
        self.events
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of entries currently marked live.
    pub fn live_count(&self) -> usize {
        self.events.iter().filter(|entry| entry.value().live).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_creates_live_entry_without_score() {
        let registry = EventRegistry::new();
        let event = registry.upsert_activate("match-1");

        assert!(event.live);
        assert_eq!(event.current_score, None);
        assert_eq!(registry.list_all().len(), 1);
    }

    #[test]
    fn test_reactivate_preserves_score_and_timestamp() {
        let registry = EventRegistry::new();
        registry.upsert_activate("match-1");

        let at = Utc::now();
        registry.record_fetch_result("match-1", "3", at);
        registry.deactivate("match-1");

        let event = registry.upsert_activate("match-1");
        assert!(event.live);
        assert_eq!(event.current_score.as_deref(), Some("3"));
        assert_eq!(event.last_updated, at);
    }

    #[test]
    fn test_deactivate_unknown_id_creates_nothing() {
        let registry = EventRegistry::new();
        assert!(!registry.deactivate("ghost"));
        assert!(registry.list_all().is_empty());
    }

    #[test]
    fn test_record_fetch_result_sets_score_and_timestamp() {
        let registry = EventRegistry::new();
        registry.upsert_activate("match-1");

        let at = Utc::now();
        assert!(registry.record_fetch_result("match-1", "10", at));

        let event = registry.get("match-1").unwrap();
        assert_eq!(event.current_score.as_deref(), Some("10"));
        assert_eq!(event.last_updated, at);
    }

    #[test]
    fn test_record_fetch_result_for_unknown_id_is_noop() {
        let registry = EventRegistry::new();
        assert!(!registry.record_fetch_result("ghost", "10", Utc::now()));
        assert!(registry.get("ghost").is_none());
    }

    #[test]
    fn test_live_count_tracks_flag() {
        let registry = EventRegistry::new();
        registry.upsert_activate("a");
        registry.upsert_activate("b");
        registry.deactivate("a");

        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.list_all().len(), 2);
    }
}
