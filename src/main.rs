use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use fable_recommender::{
    api::{create_router, AppState},
    config::Config,
    platform::{HttpPlatformClient, PlatformClient},
    services::{CatalogueCache, RecommendationEngine, UserStateStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    tracing::info!(platform_url = %config.platform_url, "Connecting to application server");
    let client: Arc<dyn PlatformClient> =
        Arc::new(HttpPlatformClient::new(config.platform_url.clone()));

    // Initial catalogue load. Failure is non-fatal: the refresh loop keeps
    // retrying and the engine serves (empty) fallbacks meanwhile.
    let catalogue = Arc::new(CatalogueCache::new(client.clone()));
    if let Err(e) = catalogue.refresh().await {
        tracing::error!(error = %e, "Initial catalogue fetch failed; starting empty");
    }

    let store = Arc::new(UserStateStore::new(client, catalogue.clone()));
    let engine = Arc::new(RecommendationEngine::new(catalogue.clone(), store.clone()));

    // Background loops: catalogue refresh and state flush.
    catalogue.spawn_refresh_loop(Duration::from_secs(config.catalogue_refresh_secs));
    store.spawn_flush_loop(Duration::from_secs(config.state_flush_secs));

    let state = AppState::new(store.clone(), engine);
    let app = create_router(state, config.max_concurrent_requests);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, "Recommender listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Persist whatever is still pending before exit.
    if let Err(e) = store.flush().await {
        tracing::error!(error = %e, "Final state flush incomplete");
    }

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install shutdown signal handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
