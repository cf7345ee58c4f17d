// Error handling framework

use thiserror::Error;

/// Scheduling errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Failed to install recurring job for event '{event_id}': {reason}")]
    SchedulingFailed { event_id: String, reason: String },
}

/// External fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("Fetch request failed for event '{event_id}': {reason}")]
    RequestFailed { event_id: String, reason: String },

    #[error("Malformed fetch response for event '{event_id}': {reason}")]
    MalformedResponse { event_id: String, reason: String },
}

/// Transport delivery errors, classified for the retry policy
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transient transport failure: {0}")]
    Transient(String),

    #[error("Fatal transport failure: {0}")]
    Fatal(String),
}

impl TransportError {
    /// Whether the publish retry loop may attempt delivery again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Transient(_))
    }
}

/// Publish pipeline errors
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Publish exhausted after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },
}

/// Orchestrator errors surfaced to command callers
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Failed to schedule tracking for event '{event_id}': {source}")]
    SchedulingFailed {
        event_id: String,
        #[source]
        source: SchedulerError,
    },
}
