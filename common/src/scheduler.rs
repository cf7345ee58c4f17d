// Per-event recurring job scheduler with cooperative cancellation

use std::future::Future;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::errors::SchedulerError;

/// Cancellation handle for one scheduled recurring job.
#[derive(Debug)]
struct JobHandle {
    token: CancellationToken,
}

impl JobHandle {
    fn cancel(&self) {
        self.token.cancel();
    }
}

/// Manages at most one recurring job per event id.
///
/// Jobs run as spawned tokio tasks on a fixed-rate tick: the first tick fires
/// after the initial delay and subsequent ticks are scheduled from the start
/// time, independent of how long each tick body takes. Cancellation is
/// cooperative: it suppresses every future tick but lets an in-flight tick
/// body run to completion.
#[derive(Debug, Default)]
pub struct TaskScheduler {
    jobs: DashMap<String, JobHandle>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any existing job for the id and install a new recurring one.
    ///
    /// The cancel-and-replace is atomic per id with respect to concurrent
    /// `start_or_replace`/`stop` calls. If no runtime is available to spawn
    /// the job onto, no handle is installed and the caller gets a
    /// `SchedulingFailed`; installation is never retried here.
    #[instrument(skip(self, job))]
    pub fn start_or_replace<F, Fut>(
        &self,
        event_id: &str,
        initial_delay: Duration,
        period: Duration,
        job: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            SchedulerError::SchedulingFailed {
                event_id: event_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        let token = CancellationToken::new();
        let tick_token = token.clone();

        runtime.spawn(async move {
            let start = time::Instant::now() + initial_delay;
            let mut ticks = time::interval_at(start, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                tokio::select! {
                    biased;
                    _ = tick_token.cancelled() => break,
                    _ = ticks.tick() => job().await,
                }
            }
        });

        match self.jobs.entry(event_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                debug!(event_id, "replacing existing scheduled job");
                occupied.get().cancel();
                occupied.insert(JobHandle { token });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(JobHandle { token });
            }
        }

        debug!(event_id, "recurring job installed");
        Ok(())
    }

    /// Cancel and remove the job for the id, if any. Returns whether a job
    /// existed. Never joins the job task, so this is safe to call from
    /// inside a tick body.
    #[instrument(skip(self))]
    pub fn stop(&self, event_id: &str) -> bool {
        match self.jobs.remove(event_id) {
            Some((_, handle)) => {
                handle.cancel();
                debug!(event_id, "scheduled job cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, event_id: &str) -> bool {
        self.jobs.contains_key(event_id)
    }

    pub fn active_count(&self) -> usize {
        self.jobs.len()
    }

    /// Cancel every job. Used on process shutdown.
    pub fn shutdown(&self) {
        self.jobs.retain(|_, handle| {
            handle.cancel();
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_job(counter: Arc<AtomicU32>) -> impl Fn() -> std::future::Ready<()> + Send + Sync {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_ticks_at_fixed_rate() {
        let scheduler = TaskScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        scheduler
            .start_or_replace(
                "match-1",
                Duration::from_millis(100),
                Duration::from_secs(1),
                counting_job(counter.clone()),
            )
            .unwrap();

        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_suppresses_future_ticks() {
        let scheduler = TaskScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        scheduler
            .start_or_replace(
                "match-1",
                Duration::from_millis(100),
                Duration::from_secs(1),
                counting_job(counter.clone()),
            )
            .unwrap();

        time::sleep(Duration::from_millis(150)).await;
        assert!(scheduler.stop("match-1"));
        let ticks_at_stop = counter.load(Ordering::SeqCst);

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), ticks_at_stop);
        assert!(!scheduler.is_scheduled("match-1"));
        assert_eq!(scheduler.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_unknown_id_is_noop() {
        let scheduler = TaskScheduler::new();
        assert!(!scheduler.stop("ghost"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_cancels_previous_job() {
        let scheduler = TaskScheduler::new();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        scheduler
            .start_or_replace(
                "match-1",
                Duration::from_millis(100),
                Duration::from_secs(1),
                counting_job(first.clone()),
            )
            .unwrap();
        time::sleep(Duration::from_millis(150)).await;

        scheduler
            .start_or_replace(
                "match-1",
                Duration::from_millis(100),
                Duration::from_secs(1),
                counting_job(second.clone()),
            )
            .unwrap();
        assert_eq!(scheduler.active_count(), 1);

        let first_at_replace = first.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(first.load(Ordering::SeqCst), first_at_replace);
        assert!(second.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_body_may_stop_its_own_schedule() {
        let scheduler = Arc::new(TaskScheduler::new());
        let counter = Arc::new(AtomicU32::new(0));

        let job_scheduler = scheduler.clone();
        let job_counter = counter.clone();
        scheduler
            .start_or_replace(
                "match-1",
                Duration::from_millis(100),
                Duration::from_secs(1),
                move || {
                    job_counter.fetch_add(1, Ordering::SeqCst);
                    job_scheduler.stop("match-1");
                    std::future::ready(())
                },
            )
            .unwrap();

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_scheduled("match-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_everything() {
        let scheduler = TaskScheduler::new();
        let counter = Arc::new(AtomicU32::new(0));

        for id in ["a", "b", "c"] {
            scheduler
                .start_or_replace(
                    id,
                    Duration::from_millis(100),
                    Duration::from_secs(1),
                    counting_job(counter.clone()),
                )
                .unwrap();
        }
        assert_eq!(scheduler.active_count(), 3);

        scheduler.shutdown();
        assert_eq!(scheduler.active_count(), 0);

        let ticks_at_shutdown = counter.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), ticks_at_shutdown);
    }

    #[test]
    fn test_start_without_runtime_is_a_scheduling_failure() {
        let scheduler = TaskScheduler::new();

        let result = scheduler.start_or_replace(
            "match-1",
            Duration::from_millis(100),
            Duration::from_secs(1),
            || std::future::ready(()),
        );

        assert!(matches!(
            result,
            Err(SchedulerError::SchedulingFailed { .. })
        ));
        assert!(!scheduler.is_scheduled("match-1"));
    }
}
