// Queue module for NATS JetStream integration

pub mod nats;
pub mod publisher;

pub use nats::{NatsClient, NatsUpdateTransport};
pub use publisher::{RetryingPublisher, UpdatePublisher, UpdateTransport};
