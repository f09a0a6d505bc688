use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogItem, MovieSummary},
};

use super::AppState;

const DEFAULT_REGION: &str = "US";

#[derive(Debug, Deserialize)]
pub struct RegionQuery {
    region: Option<String>,
}

/// Genre carousel
pub async fn by_genre(
    State(state): State<Arc<AppState>>,
    Path(genre_id): Path<u32>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    let movies = state.enrichment.provider().discover_by_genre(genre_id).await?;
    Ok(Json(to_items(&state, movies)))
}

/// Titles offered by one watch provider in a region
pub async fn by_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<u32>,
    Query(params): Query<RegionQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    let region = params
        .region
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let movies = state
        .enrichment
        .provider()
        .discover_by_provider(provider_id, &region)
        .await?;
    Ok(Json(to_items(&state, movies)))
}

fn to_items(state: &AppState, movies: Vec<MovieSummary>) -> Vec<CatalogItem> {
    let base = state.enrichment.image_base_url();
    movies
        .into_iter()
        .map(|movie| CatalogItem::from_summary(movie, base))
        .collect()
}
