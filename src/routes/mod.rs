use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    catalog::{CatalogStore, SnapshotInfo},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::EnrichmentService,
};

pub mod admin;
pub mod discover;
pub mod recommendations;
pub mod titles;
pub mod trending;

/// Shared handler state
pub struct AppState {
    pub catalog: CatalogStore,
    pub enrichment: EnrichmentService,
    /// Used when a recommendation request has no `k`
    pub recommendation_count: usize,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titles/search", get(titles::search))
        .route("/recommendations", get(recommendations::recommend))
        .route("/trending", get(trending::trending))
        .route("/discover/genres/:genre_id", get(discover::by_genre))
        .route("/discover/providers/:provider_id", get(discover::by_provider))
        .route("/admin/reload", post(admin::reload))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    catalog: SnapshotInfo,
}

/// Health check endpoint, reports the published catalog snapshot
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.catalog.snapshot().await;
    Json(HealthResponse {
        status: "healthy",
        catalog: snapshot.info(),
    })
}
