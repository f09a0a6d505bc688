use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{error::AppResult, models::EnrichedTitle, services::EnrichmentTarget};

use super::AppState;

/// Popular titles, enriched like recommendations
pub async fn trending(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<EnrichedTitle>>> {
    let popular = state.enrichment.provider().popular().await?;
    let targets = popular.into_iter().map(EnrichmentTarget::from).collect();
    Ok(Json(state.enrichment.enrich_all(targets).await))
}
