use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::TitleRecord,
};

/// Precomputed similarity artifact produced by the offline pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityArtifact {
    /// Titles table plus a dense N x N similarity matrix
    SimilarityMatrix(MatrixArtifact),
    /// Titles plus a TF-IDF feature matrix for cosine k-NN
    NeighborIndex(NeighborIndexArtifact),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixArtifact {
    pub titles: Vec<TitleRecord>,
    pub matrix: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborIndexArtifact {
    pub titles: Vec<TitleRecord>,
    pub features: SparseMatrix,
    /// Normalized title -> row index, as exported by the pipeline
    #[serde(default)]
    pub title_index: HashMap<String, usize>,
}

/// Row-major sparse matrix, each row a list of (column, weight)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SparseMatrix {
    pub dimensions: usize,
    pub rows: Vec<Vec<(u32, f32)>>,
}

/// On-disk encoding, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Bincode,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> AppResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(ArtifactFormat::Json),
            Some("bin") | Some("bincode") => Ok(ArtifactFormat::Bincode),
            other => Err(AppError::Artifact(format!(
                "unsupported artifact extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }
}

impl SimilarityArtifact {
    pub fn titles(&self) -> &[TitleRecord] {
        match self {
            SimilarityArtifact::SimilarityMatrix(a) => &a.titles,
            SimilarityArtifact::NeighborIndex(a) => &a.titles,
        }
    }

    pub fn variant(&self) -> &'static str {
        match self {
            SimilarityArtifact::SimilarityMatrix(_) => "similarity_matrix",
            SimilarityArtifact::NeighborIndex(_) => "neighbor_index",
        }
    }

    /// Reads an artifact from disk. Blocking; call from `spawn_blocking` in async code.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let format = ArtifactFormat::from_path(path)?;

        let data = std::fs::read(path)
            .map_err(|e| AppError::Artifact(format!("failed to read {}: {}", path.display(), e)))?;

        let artifact: SimilarityArtifact = match format {
            ArtifactFormat::Json => serde_json::from_slice(&data)
                .map_err(|e| AppError::Artifact(format!("invalid JSON artifact: {}", e)))?,
            ArtifactFormat::Bincode => bincode::deserialize(&data)
                .map_err(|e| AppError::Artifact(format!("invalid bincode artifact: {}", e)))?,
        };

        tracing::info!(
            path = %path.display(),
            variant = artifact.variant(),
            titles = artifact.titles().len(),
            bytes = data.len(),
            "Loaded similarity artifact"
        );

        Ok(artifact)
    }

    /// Writes the artifact through a temporary file so readers never see a partial file
    pub fn save(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let data = match ArtifactFormat::from_path(path)? {
            ArtifactFormat::Json => serde_json::to_vec(self)
                .map_err(|e| AppError::Internal(format!("Artifact serialization error: {}", e)))?,
            ArtifactFormat::Bincode => bincode::serialize(self)
                .map_err(|e| AppError::Internal(format!("Artifact serialization error: {}", e)))?,
        };

        let temp_file = path.with_extension("tmp");
        std::fs::write(&temp_file, &data)
            .and_then(|_| std::fs::rename(&temp_file, path))
            .map_err(|e| AppError::Artifact(format!("failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalId;

    fn matrix_artifact() -> SimilarityArtifact {
        SimilarityArtifact::SimilarityMatrix(MatrixArtifact {
            titles: vec![
                TitleRecord::new("A", Some(ExternalId::from(1))),
                TitleRecord::new("B", Some(ExternalId::from(2))),
            ],
            matrix: vec![vec![1.0, 0.4], vec![0.4, 1.0]],
        })
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ArtifactFormat::from_path(Path::new("a/similarity.json")).unwrap(),
            ArtifactFormat::Json
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("movies.bin")).unwrap(),
            ArtifactFormat::Bincode
        );
        assert!(ArtifactFormat::from_path(Path::new("similarity.pkl")).is_err());
    }

    #[test]
    fn test_parse_matrix_json() {
        let json = r#"{
            "similarity_matrix": {
                "titles": [
                    {"title": "Avatar", "external_id": 19995},
                    {"title": "Spectre", "external_id": "206647"}
                ],
                "matrix": [[1.0, 0.2], [0.2, 1.0]]
            }
        }"#;

        let artifact: SimilarityArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.variant(), "similarity_matrix");
        assert_eq!(artifact.titles()[0].external_id, Some(ExternalId::from(19995)));
        assert_eq!(artifact.titles()[1].external_id, Some(ExternalId::from(206647)));
    }

    #[test]
    fn test_parse_neighbor_index_json() {
        let json = r#"{
            "neighbor_index": {
                "titles": [{"title": "Avatar"}, {"title": "Aliens"}],
                "features": {"dimensions": 3, "rows": [[[0, 0.7], [2, 0.7]], [[0, 1.0]]]},
                "title_index": {"avatar": 0, "aliens": 1}
            }
        }"#;

        let artifact: SimilarityArtifact = serde_json::from_str(json).unwrap();
        match artifact {
            SimilarityArtifact::NeighborIndex(a) => {
                assert_eq!(a.features.rows[0], vec![(0, 0.7), (2, 0.7)]);
                assert_eq!(a.title_index.get("aliens"), Some(&1));
            }
            other => panic!("unexpected variant {}", other.variant()),
        }
    }

    #[test]
    fn test_save_and_load_bincode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");

        matrix_artifact().save(&path).unwrap();
        let loaded = SimilarityArtifact::load(&path).unwrap();

        assert_eq!(loaded.titles(), matrix_artifact().titles());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_and_load_neighbor_index_bincode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bincode");

        let artifact = SimilarityArtifact::NeighborIndex(NeighborIndexArtifact {
            titles: vec![
                TitleRecord::new("Avatar", Some(ExternalId::from(19995))),
                TitleRecord::new("Aliens", None),
            ],
            features: SparseMatrix {
                dimensions: 3,
                rows: vec![vec![(0, 0.7), (2, 0.7)], vec![(1, 1.0)]],
            },
            title_index: HashMap::from([("avatar".to_string(), 0), ("aliens".to_string(), 1)]),
        });
        artifact.save(&path).unwrap();

        match SimilarityArtifact::load(&path).unwrap() {
            SimilarityArtifact::NeighborIndex(loaded) => {
                assert_eq!(loaded.titles[0].external_id, Some(ExternalId::from(19995)));
                assert_eq!(loaded.titles[1].external_id, None);
                assert_eq!(loaded.features.dimensions, 3);
                assert_eq!(loaded.features.rows[0], vec![(0, 0.7), (2, 0.7)]);
                assert_eq!(loaded.title_index.get("aliens"), Some(&1));
                assert_eq!(loaded.title_index.len(), 2);
            }
            other => panic!("unexpected variant {}", other.variant()),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = SimilarityArtifact::load("/nonexistent/similarity.json");
        assert!(matches!(result, Err(AppError::Artifact(_))));
    }

    #[test]
    fn test_load_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.json");
        std::fs::write(&path, b"{\"similarity_matrix\": ").unwrap();

        let result = SimilarityArtifact::load(&path);
        assert!(matches!(result, Err(AppError::Artifact(_))));
    }
}
