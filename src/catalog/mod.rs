/// Read-only catalog state: the title registry and the similarity backend
/// built from one artifact, published as an immutable snapshot.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub mod artifact;
pub mod registry;
pub mod similarity;
pub mod store;

pub use artifact::SimilarityArtifact;
pub use registry::{fold_case, TitleRegistry};
pub use similarity::{MatrixSimilarity, Neighbor, NeighborIndex, SimilarityProvider};
pub use store::CatalogStore;

/// Registry and similarity backend built from the same artifact
pub struct CatalogSnapshot {
    pub registry: TitleRegistry,
    pub similarity: Box<dyn SimilarityProvider>,
    pub source: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

/// Summary of a snapshot for health and reload responses
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub titles: usize,
    pub backend: &'static str,
    pub source: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Validates an artifact and builds the matching backend
    pub fn from_artifact(artifact: SimilarityArtifact) -> AppResult<Self> {
        if artifact.titles().is_empty() {
            return Err(AppError::Artifact("artifact contains no titles".to_string()));
        }

        let (registry, similarity): (TitleRegistry, Box<dyn SimilarityProvider>) = match artifact {
            SimilarityArtifact::SimilarityMatrix(a) => {
                let registry = TitleRegistry::new(a.titles);
                let matrix = MatrixSimilarity::new(a.matrix)?;
                (registry, Box::new(matrix))
            }
            SimilarityArtifact::NeighborIndex(a) => {
                let registry = TitleRegistry::new(a.titles);
                check_title_index(&registry, &a.title_index)?;
                let index = NeighborIndex::fit(a.features)?;
                (registry, Box::new(index))
            }
        };

        if registry.len() != similarity.len() {
            return Err(AppError::Artifact(format!(
                "titles table has {} rows but {} has {}",
                registry.len(),
                similarity.kind(),
                similarity.len()
            )));
        }

        Ok(Self {
            registry,
            similarity,
            source: None,
            loaded_at: Utc::now(),
        })
    }

    /// Loads and validates the artifact at `path`. Blocking.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let mut snapshot = Self::from_artifact(SimilarityArtifact::load(path)?)?;
        snapshot.source = Some(path.to_path_buf());
        Ok(snapshot)
    }

    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            titles: self.registry.len(),
            backend: self.similarity.kind(),
            source: self.source.as_ref().map(|p| p.display().to_string()),
            loaded_at: self.loaded_at,
        }
    }
}

/// The exported title map must agree with the titles table
fn check_title_index(
    registry: &TitleRegistry,
    title_index: &std::collections::HashMap<String, usize>,
) -> AppResult<()> {
    for (key, &row) in title_index {
        match registry.folded_title(row) {
            Some(folded) if folded == fold_case(key) => {}
            Some(folded) => {
                return Err(AppError::Artifact(format!(
                    "title index maps {:?} to row {} which holds {:?}",
                    key, row, folded
                )))
            }
            None => {
                return Err(AppError::Artifact(format!(
                    "title index maps {:?} to row {} outside {} titles",
                    key,
                    row,
                    registry.len()
                )))
            }
        }
    }
    Ok(())
}
