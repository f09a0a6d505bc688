use crate::error::{AppError, AppResult};

use super::{by_score_desc, check_query, Neighbor, SimilarityProvider};

/// Dense square similarity matrix, `scores[i][j]` = similarity of title i to title j
#[derive(Debug, Clone)]
pub struct MatrixSimilarity {
    scores: Vec<Vec<f32>>,
}

impl MatrixSimilarity {
    /// Validates the matrix shape and contents.
    ///
    /// Symmetry is not checked; only row `i` is read when querying title `i`.
    pub fn new(scores: Vec<Vec<f32>>) -> AppResult<Self> {
        let n = scores.len();
        for (i, row) in scores.iter().enumerate() {
            if row.len() != n {
                return Err(AppError::Artifact(format!(
                    "similarity matrix is not square: row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            if let Some(j) = row.iter().position(|s| !s.is_finite()) {
                return Err(AppError::Artifact(format!(
                    "similarity matrix has a non-finite score at ({}, {})",
                    i, j
                )));
            }
        }
        Ok(Self { scores })
    }
}

impl SimilarityProvider for MatrixSimilarity {
    fn len(&self) -> usize {
        self.scores.len()
    }

    fn neighbors(&self, row_index: usize, k: usize) -> AppResult<Vec<Neighbor>> {
        check_query(row_index, k, self.len())?;

        let mut ranked: Vec<Neighbor> = self.scores[row_index]
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != row_index)
            .map(|(index, &score)| Neighbor { index, score })
            .collect();

        ranked.sort_by(by_score_desc);
        ranked.truncate(k);
        Ok(ranked)
    }

    fn kind(&self) -> &'static str {
        "similarity_matrix"
    }
}
