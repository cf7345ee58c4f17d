// Backoff policy for the publish retry loop

use std::time::Duration;

use crate::config::PublisherConfig;

/// Bounded exponential backoff over a fixed number of attempts.
///
/// Attempts are 1-based and capped at `max_attempts` in total, including the
/// first. The delay before attempt `n` is `initial_backoff *
/// multiplier^(n-2)`; the first attempt carries no delay.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    multiplier: f64,
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            multiplier: multiplier.max(1.0),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before the given attempt.
    ///
    /// Returns `None` for the first attempt and for attempts beyond
    /// `max_attempts`; delays are non-decreasing across attempts.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt <= 1 || attempt > self.max_attempts {
            return None;
        }
        let factor = self.multiplier.powi(attempt as i32 - 2);
        Some(self.initial_backoff.mul_f64(factor))
    }
}

impl From<&PublisherConfig> for BackoffPolicy {
    fn from(config: &PublisherConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            config.backoff_multiplier,
        )
    }
}
