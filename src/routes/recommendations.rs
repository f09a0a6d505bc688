use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::EnrichedTitle,
    services::{recommendations, EnrichmentTarget},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: String,
    pub recommendations: Vec<EnrichedTitle>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let k = params.k.unwrap_or(state.recommendation_count);
    let catalog = state.catalog.snapshot().await;

    let scored = recommendations::recommend(&catalog, &params.title, k)?;
    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        k,
        found = scored.len(),
        "Serving recommendations"
    );

    let targets = scored.into_iter().map(EnrichmentTarget::from).collect();
    let recommendations = state.enrichment.enrich_all(targets).await;

    Ok(Json(RecommendationResponse {
        query: params.title,
        recommendations,
    }))
}
