// Tracking orchestrator: activation commands, per-tick poll bodies

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::config::TrackingConfig;
use crate::errors::TrackerError;
use crate::fetcher::EventFetcher;
use crate::models::{EventUpdate, TrackedEvent};
use crate::queue::UpdatePublisher;
use crate::registry::EventRegistry;
use crate::scheduler::TaskScheduler;

/// Ties the registry, the scheduler, and the fetch/publish collaborators
/// together. Activation upserts registry state and (re)starts the poll job;
/// deactivation flips liveness and cancels it. The event id is the sole key
/// shared between registry and scheduler.
///
/// Cheap to clone; every clone drives the same tracking state.
#[derive(Clone)]
pub struct EventTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    registry: Arc<EventRegistry>,
    scheduler: Arc<TaskScheduler>,
    fetcher: Arc<dyn EventFetcher>,
    publisher: Arc<dyn UpdatePublisher>,
    config: TrackingConfig,
}

impl EventTracker {
    pub fn new(
        registry: Arc<EventRegistry>,
        scheduler: Arc<TaskScheduler>,
        fetcher: Arc<dyn EventFetcher>,
        publisher: Arc<dyn UpdatePublisher>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                registry,
                scheduler,
                fetcher,
                publisher,
                config,
            }),
        }
    }

    /// Sole entry point for activation and deactivation commands.
    ///
    /// Activating an already-live event restarts its poll job from a fresh
    /// initial delay. Only scheduling failures propagate; the registry entry
    /// then stays live with no job, and the caller may retry the activation.
    #[instrument(skip(self))]
    pub fn set_status(&self, event_id: &str, live: bool) -> Result<(), TrackerError> {
        if event_id.trim().is_empty() {
            return Err(TrackerError::InvalidCommand(
                "event id must not be blank".to_string(),
            ));
        }

        if live {
            self.start_tracking(event_id)
        } else {
            self.stop_tracking(event_id);
            Ok(())
        }
    }

    fn start_tracking(&self, event_id: &str) -> Result<(), TrackerError> {
        info!(event_id, "starting event tracking");

        self.inner.registry.upsert_activate(event_id);

        let inner = Arc::clone(&self.inner);
        let id = event_id.to_string();
        self.inner
            .scheduler
            .start_or_replace(
                event_id,
                self.inner.config.initial_delay(),
                self.inner.config.poll_interval(),
                move || {
                    let inner = Arc::clone(&inner);
                    let event_id = id.clone();
                    async move { inner.poll_once(&event_id).await }
                },
            )
            .map_err(|source| {
                error!(event_id, error = %source, "failed to schedule event tracking");
                TrackerError::SchedulingFailed {
                    event_id: event_id.to_string(),
                    source,
                }
            })
    }

    fn stop_tracking(&self, event_id: &str) {
        info!(event_id, "stopping event tracking");

        // Flip liveness before cancelling so an in-flight tick observes
        // live == false and self-aborts even if cancellation lands late.
        self.inner.registry.deactivate(event_id);
        self.inner.scheduler.stop(event_id);
    }

    /// Snapshot of every known event, live or not.
    pub fn list_all(&self) -> HashMap<String, TrackedEvent> {
        self.inner.registry.list_all()
    }
}

impl TrackerInner {
    /// One scheduled tick for an event: liveness check, fetch, record,
    /// publish. Every per-tick failure is contained here so the recurring
    /// job keeps running.
    #[instrument(skip(self))]
    async fn poll_once(&self, event_id: &str) {
        match self.registry.get(event_id) {
            Some(event) if event.live => {}
            _ => {
                warn!(event_id, "tick for non-live event, cancelling its job");
                self.scheduler.stop(event_id);
                return;
            }
        }

        let fetched = match self.fetcher.fetch(event_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(event_id, error = %e, "fetch failed, skipping tick");
                return;
            }
        };

        let fetched_at = Utc::now();
        self.registry
            .record_fetch_result(event_id, &fetched.current_score, fetched_at);
        info!(event_id, score = %fetched.current_score, "recorded fetched score");

        let Some(state) = self.registry.get(event_id) else {
            return;
        };
        let update = EventUpdate {
            event_id: state.event_id,
            live: state.live,
            current_score: fetched.current_score,
            fetched_at,
        };

        if let Err(e) = self.publisher.publish(&update).await {
            error!(event_id, error = %e, "publish failed, update dropped");
        }
    }
}
