use std::sync::Arc;

use dashmap::DashMap;

use common::queue::NatsClient;
use common::tracker::EventTracker;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub tracker: EventTracker,
    pub nats: Arc<NatsClient>,
    /// Backing counters for the mock upstream endpoint
    pub mock_scores: Arc<DashMap<String, u64>>,
}

impl AppState {
    pub fn new(tracker: EventTracker, nats: Arc<NatsClient>) -> Self {
        Self {
            tracker,
            nats,
            mock_scores: Arc::new(DashMap::new()),
        }
    }
}
