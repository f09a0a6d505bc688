use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{catalog::SnapshotInfo, error::AppResult};

use super::AppState;

/// Re-reads the artifact and publishes the new snapshot
pub async fn reload(State(state): State<Arc<AppState>>) -> AppResult<Json<SnapshotInfo>> {
    let snapshot = state.catalog.reload().await?;
    Ok(Json(snapshot.info()))
}
