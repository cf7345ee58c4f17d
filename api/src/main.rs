use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;
mod routes;
mod state;

use common::config::Settings;
use common::fetcher::HttpEventFetcher;
use common::queue::{NatsClient, NatsUpdateTransport, RetryingPublisher};
use common::registry::EventRegistry;
use common::scheduler::TaskScheduler;
use common::tracker::EventTracker;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::info!("Starting live event tracking service");

    // Load configuration
    let settings = Settings::load()?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    tracing::info!(
        host = %settings.server.host,
        port = settings.server.port,
        nats_url = %settings.nats.url,
        "Configuration loaded"
    );

    // Initialize NATS client and the update stream
    let nats = Arc::new(
        NatsClient::connect(settings.nats.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize NATS client: {e}"))?,
    );
    nats.initialize_stream()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize NATS stream: {e}"))?;
    tracing::info!(stream = %settings.nats.stream_name, "NATS stream initialized");

    // Wire the tracking core
    let transport = Arc::new(NatsUpdateTransport::new(&nats));
    let publisher = Arc::new(RetryingPublisher::new(transport, &settings.publisher));
    let fetcher = Arc::new(
        HttpEventFetcher::new(&settings.fetcher)
            .map_err(|e| anyhow::anyhow!("Failed to build event fetcher: {e}"))?,
    );
    let registry = Arc::new(EventRegistry::new());
    let scheduler = Arc::new(TaskScheduler::new());
    let tracker = EventTracker::new(
        registry,
        Arc::clone(&scheduler),
        fetcher,
        publisher,
        settings.tracking.clone(),
    );
    tracing::info!("Event tracker initialized");

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let app_state = AppState::new(tracker, nats);
    let router = routes::create_router(app_state);

    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(scheduler))
        .await?;

    tracing::info!("Service stopped");
    Ok(())
}

/// Wait for Ctrl+C, then cancel every scheduled poll job before the server
/// drains.
async fn shutdown_signal(scheduler: Arc<TaskScheduler>) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    tracing::info!("Shutdown signal received, cancelling scheduled jobs");
    scheduler.shutdown();
}
