use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cinephile_api::{
    catalog::CatalogStore,
    config::Config,
    db::{create_redis_client, Cache},
    routes::{create_router, AppState},
    services::{EnrichmentService, EnrichmentSettings, TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinephile_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // A missing or invalid artifact aborts startup
    let artifact_path = config.artifact_path.clone();
    let catalog = tokio::task::spawn_blocking(move || CatalogStore::open(artifact_path)).await??;

    let (cache, cache_writer) = match config.redis_url.as_deref() {
        Some(url) => {
            let client = create_redis_client(url)?;
            tracing::info!("Metadata cache enabled");
            Cache::new(client)
        }
        None => {
            tracing::info!("REDIS_URL not set, metadata cache disabled");
            Cache::disabled()
        }
    };

    let provider = TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_language.clone(),
        config.enrichment_timeout(),
    )?;

    let enrichment = EnrichmentService::new(
        Arc::new(provider),
        EnrichmentSettings {
            call_timeout: config.enrichment_timeout(),
            deadline: config.enrichment_deadline(),
            retries: config.enrichment_retries,
            retry_backoff: config.enrichment_retry_backoff(),
            cast_limit: config.cast_limit,
            image_base_url: config.tmdb_image_base_url.clone(),
        },
    );

    let state = Arc::new(AppState {
        catalog,
        enrichment,
        recommendation_count: config.recommendation_count,
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
