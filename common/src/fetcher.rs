// External event source client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::config::FetcherConfig;
use crate::errors::FetchError;
use crate::models::FetchedEvent;

/// Boundary to the external event source.
///
/// One fetch is a single attempt; any retry discipline belongs to the
/// collaborator behind this trait, not to the callers.
#[async_trait]
pub trait EventFetcher: Send + Sync {
    async fn fetch(&self, event_id: &str) -> Result<FetchedEvent, FetchError>;
}

/// Fetches event state over HTTP.
///
/// Expects `GET {base_url}/{event_id}` to return a JSON object carrying a
/// `currentScore` field.
pub struct HttpEventFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EventFetcher for HttpEventFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, event_id: &str) -> Result<FetchedEvent, FetchError> {
        let url = format!("{}/{}", self.base_url, event_id);
        debug!(url = %url, "fetching event state");

        let response = self.client.get(&url).send().await.map_err(|e| {
            FetchError::RequestFailed {
                event_id: event_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RequestFailed {
                event_id: event_id.to_string(),
                reason: format!("unexpected status {status}"),
            });
        }

        let body: HashMap<String, String> =
            response
                .json()
                .await
                .map_err(|e| FetchError::MalformedResponse {
                    event_id: event_id.to_string(),
                    reason: e.to_string(),
                })?;

        let current_score =
            body.get("currentScore")
                .cloned()
                .ok_or_else(|| FetchError::MalformedResponse {
                    event_id: event_id.to_string(),
                    reason: "missing 'currentScore' field".to_string(),
                })?;

        Ok(FetchedEvent {
            event_id: event_id.to_string(),
            current_score,
        })
    }
}
