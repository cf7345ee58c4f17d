// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub nats: NatsConfig,
    pub fetcher: FetcherConfig,
    pub tracking: TrackingConfig,
    pub publisher: PublisherConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL (e.g., "nats://localhost:4222")
    pub url: String,
    /// Stream name for event updates
    pub stream_name: String,
    /// Subject prefix; updates are published to `{prefix}.{event_id}`
    pub subject_prefix: String,
    /// Maximum age for messages in the stream (in seconds)
    pub max_age_seconds: u64,
    /// Maximum number of messages to retain
    pub max_messages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the external event source; the event id is appended
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// How often each live event is polled (in seconds)
    pub poll_interval_seconds: u64,
    /// Delay before the first poll after activation (in seconds)
    pub initial_delay_seconds: u64,
}

impl TrackingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Total delivery attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt (in milliseconds)
    pub initial_backoff_ms: u64,
    /// Backoff growth factor between attempts
    pub backoff_multiplier: f64,
    /// Per-attempt delivery timeout (in seconds)
    pub publish_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Settings {
    /// Load configuration with layered precedence: defaults file → local file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.nats.url.is_empty() {
            return Err("NATS URL cannot be empty".to_string());
        }
        if self.nats.stream_name.is_empty() {
            return Err("NATS stream_name cannot be empty".to_string());
        }
        if self.nats.subject_prefix.is_empty() {
            return Err("NATS subject_prefix cannot be empty".to_string());
        }

        if self.fetcher.base_url.is_empty() {
            return Err("Fetcher base_url cannot be empty".to_string());
        }

        if self.tracking.poll_interval_seconds == 0 {
            return Err("Tracking poll_interval_seconds must be greater than 0".to_string());
        }

        if self.publisher.max_attempts == 0 {
            return Err("Publisher max_attempts must be greater than 0".to_string());
        }
        if self.publisher.backoff_multiplier < 1.0 {
            return Err("Publisher backoff_multiplier must be at least 1.0".to_string());
        }
        if self.publisher.publish_timeout_seconds == 0 {
            return Err("Publisher publish_timeout_seconds must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                stream_name: "EVENTS".to_string(),
                subject_prefix: "events.updates".to_string(),
                max_age_seconds: 86400, // 24 hours
                max_messages: 1_000_000,
            },
            fetcher: FetcherConfig {
                base_url: "http://localhost:8080/mock-api/events".to_string(),
                request_timeout_seconds: 5,
            },
            tracking: TrackingConfig {
                poll_interval_seconds: 10,
                initial_delay_seconds: 1,
            },
            publisher: PublisherConfig {
                max_attempts: 5,
                initial_backoff_ms: 500,
                backoff_multiplier: 1.5,
                publish_timeout_seconds: 10,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}
