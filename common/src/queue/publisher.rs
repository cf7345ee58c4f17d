// Retrying update publisher over a pluggable transport

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::config::PublisherConfig;
use crate::errors::{PublishError, TransportError};
use crate::models::EventUpdate;
use crate::retry::BackoffPolicy;

/// Delivers one update downstream, absorbing transient transport failures.
#[async_trait::async_trait]
pub trait UpdatePublisher: Send + Sync {
    /// At-least-once delivery: `Ok` means the transport accepted the
    /// message; `Err` means every attempt is finished and abandoned.
    async fn publish(&self, update: &EventUpdate) -> Result<(), PublishError>;
}

/// One delivery attempt against the downstream broker.
#[async_trait::async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn send(&self, subject_key: &str, update: &EventUpdate) -> Result<(), TransportError>;
}

/// Publisher wrapping a transport with a bounded exponential-backoff retry
/// loop. Each attempt is bounded by `attempt_timeout`; a timed-out attempt
/// counts as a transient failure. Fatal transport errors short-circuit.
pub struct RetryingPublisher {
    transport: Arc<dyn UpdateTransport>,
    policy: BackoffPolicy,
    attempt_timeout: Duration,
}

impl RetryingPublisher {
    pub fn new(transport: Arc<dyn UpdateTransport>, config: &PublisherConfig) -> Self {
        Self {
            transport,
            policy: BackoffPolicy::from(config),
            attempt_timeout: Duration::from_secs(config.publish_timeout_seconds),
        }
    }

    pub fn with_policy(
        transport: Arc<dyn UpdateTransport>,
        policy: BackoffPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            policy,
            attempt_timeout,
        }
    }

    async fn attempt_once(&self, update: &EventUpdate) -> Result<(), TransportError> {
        match tokio::time::timeout(
            self.attempt_timeout,
            self.transport.send(&update.event_id, update),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Transient(format!(
                "delivery attempt timed out after {:?}",
                self.attempt_timeout
            ))),
        }
    }
}

#[async_trait::async_trait]
impl UpdatePublisher for RetryingPublisher {
    #[instrument(skip(self, update), fields(event_id = %update.event_id))]
    async fn publish(&self, update: &EventUpdate) -> Result<(), PublishError> {
        let mut attempt: u32 = 1;

        loop {
            match self.attempt_once(update).await {
                Ok(()) => {
                    debug!(attempt, "update published");
                    return Ok(());
                }
                Err(error) if !error.is_retryable() => {
                    return Err(PublishError::Exhausted {
                        attempts: attempt,
                        last: error,
                    });
                }
                Err(error) => match self.policy.delay_before(attempt + 1) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "transient publish failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        return Err(PublishError::Exhausted {
                            attempts: attempt,
                            last: error,
                        });
                    }
                },
            }
        }
    }
}
