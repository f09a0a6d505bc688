use crate::{
    catalog::CatalogSnapshot,
    error::{AppError, AppResult},
    models::ScoredTitle,
};

/// Default number of recommendations per query
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// Finds the `k` titles most similar to `query_title`
///
/// The title must match a catalog entry exactly, ignoring case. The query
/// title itself is never part of the result.
pub fn recommend(
    catalog: &CatalogSnapshot,
    query_title: &str,
    k: usize,
) -> AppResult<Vec<ScoredTitle>> {
    let row_index = catalog
        .registry
        .resolve(query_title)
        .ok_or_else(|| AppError::TitleNotFound(query_title.to_string()))?;

    let neighbors = catalog.similarity.neighbors(row_index, k)?;

    let recommendations = neighbors
        .into_iter()
        .map(|neighbor| {
            let title = catalog.registry.materialize(neighbor.index).map_err(|e| {
                AppError::Desync(format!(
                    "{} returned row {} unknown to the registry: {}",
                    catalog.similarity.kind(),
                    neighbor.index,
                    e
                ))
            })?;
            Ok(ScoredTitle {
                title,
                score: neighbor.score,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(
        query = %query_title,
        row_index,
        k,
        backend = catalog.similarity.kind(),
        "Recommendations computed"
    );

    Ok(recommendations)
}
