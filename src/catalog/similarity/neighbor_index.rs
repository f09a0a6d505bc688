use std::cmp::Ordering;

use crate::{
    catalog::artifact::SparseMatrix,
    error::{AppError, AppResult},
};

use super::{check_query, Neighbor, SimilarityProvider};

/// A sparse TF-IDF row: (column, weight) pairs sorted by column
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
    /// Accumulated in f64; squares of large f32 weights overflow f32
    norm: f64,
}

impl SparseVector {
    /// Builds a vector over a vocabulary of `dimensions` terms.
    ///
    /// Entries may arrive in any order; explicit zeros are dropped.
    pub fn new(mut entries: Vec<(u32, f32)>, dimensions: usize) -> AppResult<Self> {
        entries.retain(|&(_, weight)| weight != 0.0);
        entries.sort_by_key(|&(column, _)| column);

        for pair in entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(AppError::Artifact(format!(
                    "feature column {} appears twice in one row",
                    pair[0].0
                )));
            }
        }
        for &(column, weight) in &entries {
            if column as usize >= dimensions {
                return Err(AppError::Artifact(format!(
                    "feature column {} outside vocabulary of {} terms",
                    column, dimensions
                )));
            }
            if !weight.is_finite() {
                return Err(AppError::Artifact(format!(
                    "feature column {} has a non-finite weight",
                    column
                )));
            }
        }

        let norm = entries
            .iter()
            .map(|&(_, w)| f64::from(w) * f64::from(w))
            .sum::<f64>()
            .sqrt();
        if !norm.is_finite() {
            return Err(AppError::Artifact(
                "feature row norm is not finite".to_string(),
            ));
        }
        Ok(Self { entries, norm })
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ca, wa) = self.entries[i];
            let (cb, wb) = other.entries[j];
            match ca.cmp(&cb) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += f64::from(wa) * f64::from(wb);
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Cosine distance in `[0, 2]`. A zero vector is at distance 1 from everything.
    pub fn cosine_distance(&self, other: &SparseVector) -> f32 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 1.0;
        }
        let similarity = self.dot(other) / (self.norm * other.norm);
        (1.0 - similarity).clamp(0.0, 2.0) as f32
    }
}

/// Row index and its distance from a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub distance: f32,
}

/// Brute-force cosine k-nearest-neighbor index over TF-IDF rows
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    rows: Vec<SparseVector>,
    dimensions: usize,
}

impl NeighborIndex {
    /// Validates the feature matrix and precomputes row norms
    pub fn fit(features: SparseMatrix) -> AppResult<Self> {
        let dimensions = features.dimensions;
        let rows = features
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                SparseVector::new(row, dimensions)
                    .map_err(|e| AppError::Artifact(format!("feature row {}: {}", i, e)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let empty_rows = rows.iter().filter(|r| r.nnz() == 0).count();
        if empty_rows > 0 {
            tracing::warn!(empty_rows, "Feature matrix has rows with no terms");
        }

        Ok(Self { rows, dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The `n` rows nearest to `query`, ascending by distance, ties by row index
    pub fn kneighbors_by_vector(&self, query: &SparseVector, n: usize) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| Hit {
                index,
                distance: query.cosine_distance(row),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        hits.truncate(n);
        hits
    }

    /// The `n` rows nearest to row `row_index`, which may include the row itself
    pub fn kneighbors(&self, row_index: usize, n: usize) -> AppResult<Vec<Hit>> {
        let query = self.rows.get(row_index).ok_or(AppError::InvalidIndex {
            index: row_index,
            len: self.rows.len(),
        })?;
        Ok(self.kneighbors_by_vector(query, n))
    }
}

impl SimilarityProvider for NeighborIndex {
    fn len(&self) -> usize {
        self.rows.len()
    }

    /// Asks the index for `k + 1` rows so the query row can be dropped.
    ///
    /// Duplicate feature vectors with a lower row index can push the query
    /// row out of those `k + 1`; the list is then cut back to `k`. Either way
    /// exactly `k` rows come back because `k < len`.
    fn neighbors(&self, row_index: usize, k: usize) -> AppResult<Vec<Neighbor>> {
        check_query(row_index, k, self.len())?;

        let neighbors: Vec<Neighbor> = self
            .kneighbors(row_index, k + 1)?
            .into_iter()
            .filter(|hit| hit.index != row_index)
            .take(k)
            .map(|hit| Neighbor {
                index: hit.index,
                score: 1.0 - hit.distance,
            })
            .collect();

        Ok(neighbors)
    }

    fn kind(&self) -> &'static str {
        "neighbor_index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(rows: Vec<Vec<(u32, f32)>>, dimensions: usize) -> NeighborIndex {
        NeighborIndex::fit(SparseMatrix { dimensions, rows }).unwrap()
    }

    fn sample() -> NeighborIndex {
        // 0: space adventure, 1: space drama, 2: romance, 3: space adventure sequel
        index(
            vec![
                vec![(0, 1.0), (1, 1.0)],
                vec![(0, 1.0), (2, 1.0)],
                vec![(3, 1.0)],
                vec![(0, 1.0), (1, 0.9), (4, 0.2)],
            ],
            5,
        )
    }

    #[test]
    fn test_cosine_distance() {
        let a = SparseVector::new(vec![(0, 1.0), (1, 1.0)], 3).unwrap();
        let b = SparseVector::new(vec![(1, 2.0), (0, 2.0)], 3).unwrap();
        let c = SparseVector::new(vec![(2, 1.0)], 3).unwrap();
        let zero = SparseVector::new(vec![], 3).unwrap();

        assert!(a.cosine_distance(&b).abs() < 1e-6);
        assert!((a.cosine_distance(&c) - 1.0).abs() < 1e-6);
        assert_eq!(a.cosine_distance(&zero), 1.0);
    }

    #[test]
    fn test_kneighbors_includes_self_first() {
        let hits = sample().kneighbors(0, 2).unwrap();
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 3);
    }

    #[test]
    fn test_neighbors_drop_self() {
        let neighbors = sample().neighbors(0, 2).unwrap();
        let order: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![3, 1]);
        assert!(neighbors[0].score >= neighbors[1].score);
    }

    #[test]
    fn test_neighbors_always_k_with_duplicates() {
        // Rows 0, 1 and 2 are identical; row 2's own entry can fall outside k + 1
        let index = index(
            vec![
                vec![(0, 1.0)],
                vec![(0, 1.0)],
                vec![(0, 1.0)],
                vec![(1, 1.0)],
            ],
            2,
        );
        let neighbors = index.neighbors(2, 1).unwrap();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].index, 0);

        for k in 1..4 {
            let neighbors = index.neighbors(2, k).unwrap();
            assert_eq!(neighbors.len(), k);
            assert!(neighbors.iter().all(|n| n.index != 2));
        }
    }

    #[test]
    fn test_kneighbors_by_vector() {
        let query = SparseVector::new(vec![(3, 0.5)], 5).unwrap();
        let hits = sample().kneighbors_by_vector(&query, 1);
        assert_eq!(hits, vec![Hit { index: 2, distance: 0.0 }]);
    }

    #[test]
    fn test_rejects_column_outside_vocabulary() {
        let result = NeighborIndex::fit(SparseMatrix {
            dimensions: 2,
            rows: vec![vec![(2, 1.0)]],
        });
        assert!(matches!(result, Err(AppError::Artifact(_))));
    }

    #[test]
    fn test_large_weights_rank_by_cosine() {
        // Squaring 3e19 overflows f32; rankings must still follow the cosine
        let index = index(
            vec![
                vec![(0, 3e19), (1, 3e19)],
                vec![(0, 1.0), (1, 0.2)],
                vec![(0, 3e19)],
                vec![(1, 1.0)],
                vec![(0, 0.5), (1, 0.5)],
            ],
            2,
        );

        let neighbors = index.neighbors(0, 4).unwrap();
        assert!(neighbors.iter().all(|n| n.score.is_finite()));

        let order: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
        assert_eq!(&order[..2], &[4, 1]);
        let mut tail = order[2..].to_vec();
        tail.sort_unstable();
        assert_eq!(tail, vec![2, 3]);

        assert!((neighbors[0].score - 1.0).abs() < 1e-5);
        assert!((neighbors[2].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_distance_is_never_nan() {
        let huge = SparseVector::new(vec![(0, f32::MAX), (1, f32::MAX)], 2).unwrap();
        let small = SparseVector::new(vec![(0, 1.0)], 2).unwrap();
        let distance = huge.cosine_distance(&small);
        assert!(distance.is_finite());
        assert!((distance - (1.0 - std::f32::consts::FRAC_1_SQRT_2)).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_duplicate_column() {
        assert!(SparseVector::new(vec![(1, 1.0), (1, 0.5)], 2).is_err());
    }

    #[test]
    fn test_invalid_k() {
        let index = sample();
        assert!(matches!(index.neighbors(0, 0), Err(AppError::InvalidArgument(_))));
        assert!(matches!(index.neighbors(0, 4), Err(AppError::InvalidArgument(_))));
        assert!(matches!(index.neighbors(7, 1), Err(AppError::InvalidIndex { .. })));
    }
}
