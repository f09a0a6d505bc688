use crate::{catalog::CatalogSnapshot, models::Title};

/// Titles containing `query`, case-insensitively, in catalog order
///
/// Used to drive autocomplete before the caller picks an exact title to
/// recommend from. `limit` caps the list; `None` returns every match.
pub fn search_titles(catalog: &CatalogSnapshot, query: &str, limit: Option<usize>) -> Vec<Title> {
    let mut titles = catalog.registry.suggest(query);
    if let Some(limit) = limit {
        titles.truncate(limit);
    }

    tracing::debug!(query = %query, results = titles.len(), "Title search completed");

    titles
}
