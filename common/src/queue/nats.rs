// NATS JetStream client and transport for event updates

use async_nats::jetstream::{
    stream::{Config as StreamConfig, RetentionPolicy, Stream},
    Context as JetStreamContext,
};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::NatsConfig;
use crate::errors::TransportError;
use crate::models::EventUpdate;
use crate::queue::publisher::UpdateTransport;

/// NATS JetStream client
pub struct NatsClient {
    client: async_nats::Client,
    jetstream: JetStreamContext,
    config: NatsConfig,
}

impl NatsClient {
    /// Create a NatsClient from an existing async_nats::Client
    pub fn from_client(client: async_nats::Client, config: NatsConfig) -> Self {
        let jetstream = async_nats::jetstream::new(client.clone());
        Self {
            client,
            jetstream,
            config,
        }
    }

    /// Connect to the NATS server
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: NatsConfig) -> Result<Self, TransportError> {
        info!("Connecting to NATS server");

        let client = async_nats::connect(&config.url)
            .await
            .map_err(|e| TransportError::Fatal(format!("Failed to connect to NATS: {e}")))?;

        info!("Connected to NATS server successfully");

        let jetstream = async_nats::jetstream::new(client.clone());

        Ok(Self {
            client,
            jetstream,
            config,
        })
    }

    /// Create or look up the update stream with its retention limits
    #[instrument(skip(self))]
    pub async fn initialize_stream(&self) -> Result<Stream, TransportError> {
        info!(
            stream_name = %self.config.stream_name,
            "Initializing JetStream stream"
        );

        let stream_config = StreamConfig {
            name: self.config.stream_name.clone(),
            subjects: vec![format!("{}.>", self.config.subject_prefix)],
            retention: RetentionPolicy::Limits,
            max_age: Duration::from_secs(self.config.max_age_seconds),
            max_messages: self.config.max_messages,
            ..Default::default()
        };

        let stream = self
            .jetstream
            .get_or_create_stream(stream_config)
            .await
            .map_err(|e| TransportError::Fatal(format!("Failed to create stream: {e}")))?;

        info!(
            stream_name = %self.config.stream_name,
            "Stream initialized successfully"
        );

        Ok(stream)
    }

    /// Get the JetStream context for publishing
    pub fn jetstream(&self) -> &JetStreamContext {
        &self.jetstream
    }

    /// Get the NATS client
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Get the configuration
    pub fn config(&self) -> &NatsConfig {
        &self.config
    }

    /// Health check - verify the update stream is reachable
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), TransportError> {
        self.jetstream
            .get_stream(&self.config.stream_name)
            .await
            .map_err(|e| TransportError::Transient(format!("Health check failed: {e}")))?;

        Ok(())
    }
}

/// JetStream-backed delivery of event updates.
///
/// Updates go to `{subject_prefix}.{event_id}` with a deduplication header
/// derived from the event id and fetch timestamp. The ack wait is unbounded
/// here; the retrying publisher owns the per-attempt timeout.
pub struct NatsUpdateTransport {
    jetstream: JetStreamContext,
    subject_prefix: String,
}

impl NatsUpdateTransport {
    pub fn new(client: &NatsClient) -> Self {
        Self {
            jetstream: client.jetstream().clone(),
            subject_prefix: client.config().subject_prefix.clone(),
        }
    }

    fn subject_for(&self, event_id: &str) -> String {
        format!("{}.{}", self.subject_prefix, event_id)
    }
}

#[async_trait::async_trait]
impl UpdateTransport for NatsUpdateTransport {
    #[instrument(skip(self, update), fields(event_id = %update.event_id))]
    async fn send(&self, subject_key: &str, update: &EventUpdate) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(update)
            .map_err(|e| TransportError::Fatal(format!("Failed to serialize event update: {e}")))?;

        let subject = self.subject_for(subject_key);

        let mut headers = async_nats::HeaderMap::new();
        headers.insert("Event-Id", update.event_id.as_str());
        headers.insert(
            "Nats-Msg-Id",
            format!(
                "{}:{}",
                update.event_id,
                update.fetched_at.timestamp_millis()
            )
            .as_str(),
        );

        let ack = self
            .jetstream
            .publish_with_headers(subject.clone(), headers, payload.into())
            .await
            .map_err(|e| TransportError::Transient(format!("Failed to publish message: {e}")))?;

        ack.await.map_err(|e| {
            TransportError::Transient(format!("Failed to get publish acknowledgment: {e}"))
        })?;

        debug!(subject = %subject, "event update acknowledged");
        Ok(())
    }
}
