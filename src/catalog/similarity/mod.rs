/// Similarity backends
///
/// Both artifact shapes answer the same question, "which rows are closest to
/// this one", so query code only ever sees the `SimilarityProvider` trait.
/// The concrete backend is picked when the artifact is loaded.
use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{AppError, AppResult};

pub mod matrix;
pub mod neighbor_index;

pub use matrix::MatrixSimilarity;
pub use neighbor_index::{NeighborIndex, SparseVector};

/// A ranked neighbor of a query row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub index: usize,
    /// Higher is more similar
    pub score: f32,
}

/// Trait for precomputed similarity structures
pub trait SimilarityProvider: Send + Sync {
    /// Number of rows in the artifact
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns exactly `k` neighbors of `row_index`, most similar first,
    /// never including `row_index` itself.
    fn neighbors(&self, row_index: usize, k: usize) -> AppResult<Vec<Neighbor>>;

    /// Backend name for logging and health reporting
    fn kind(&self) -> &'static str;
}

/// Checks the arguments shared by every backend
pub(crate) fn check_query(row_index: usize, k: usize, len: usize) -> AppResult<()> {
    if row_index >= len {
        return Err(AppError::InvalidIndex {
            index: row_index,
            len,
        });
    }
    if k == 0 || k >= len {
        return Err(AppError::InvalidArgument(format!(
            "k must be between 1 and {} for a catalog of {} titles, got {}",
            len.saturating_sub(1),
            len,
            k
        )));
    }
    Ok(())
}

/// Descending score, ties broken by ascending row index
pub(crate) fn by_score_desc(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}
