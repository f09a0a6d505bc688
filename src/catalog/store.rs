use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

use super::CatalogSnapshot;

/// Holds the published catalog snapshot.
///
/// Readers clone the `Arc` and release the lock immediately, so a query keeps
/// using the snapshot it started with even if a reload lands mid-request.
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
    artifact_path: Option<PathBuf>,
}

impl CatalogStore {
    /// Loads the artifact at `path` and publishes it. Blocking.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let snapshot = CatalogSnapshot::load(&path)?;
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
            artifact_path: Some(path),
        })
    }

    /// Wraps an already-built snapshot; such a store cannot be reloaded
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            artifact_path: None,
        }
    }

    /// The snapshot currently being served
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().await.clone()
    }

    /// Re-reads the artifact and swaps it in.
    ///
    /// The new snapshot is fully built before the write lock is taken. On
    /// failure the previous snapshot stays published.
    pub async fn reload(&self) -> AppResult<Arc<CatalogSnapshot>> {
        let path = self.artifact_path.clone().ok_or_else(|| {
            AppError::InvalidArgument("catalog was not loaded from a file".to_string())
        })?;

        let snapshot = tokio::task::spawn_blocking(move || CatalogSnapshot::load(path))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| {
                tracing::error!(error = %e, "Artifact reload failed, keeping current snapshot");
                e
            })?;

        let snapshot = Arc::new(snapshot);
        *self.current.write().await = snapshot.clone();

        tracing::info!(
            titles = snapshot.registry.len(),
            backend = snapshot.similarity.kind(),
            "Catalog snapshot reloaded"
        );

        Ok(snapshot)
    }
}
