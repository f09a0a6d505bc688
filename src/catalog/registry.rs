use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{Title, TitleRecord},
};

/// Case folding used for every title comparison.
///
/// Internal whitespace is left untouched: "The  Matrix" and "The Matrix" are
/// different titles.
pub fn fold_case(title: &str) -> String {
    title.to_lowercase()
}

/// Bidirectional mapping between catalog titles and artifact row indices
#[derive(Debug, Clone)]
pub struct TitleRegistry {
    records: Vec<TitleRecord>,
    folded: Vec<String>,
    by_folded: HashMap<String, usize>,
}

impl TitleRegistry {
    /// Builds the registry from the artifact's titles table.
    ///
    /// Row `i` of the table becomes row index `i`. When two titles fold to
    /// the same string, the earlier row wins.
    pub fn new(records: Vec<TitleRecord>) -> Self {
        let folded: Vec<String> = records.iter().map(|r| fold_case(&r.title)).collect();

        let mut by_folded = HashMap::with_capacity(folded.len());
        for (index, key) in folded.iter().enumerate() {
            by_folded.entry(key.clone()).or_insert(index);
        }

        if by_folded.len() < folded.len() {
            tracing::warn!(
                titles = folded.len(),
                distinct = by_folded.len(),
                "Registry contains case-insensitive duplicate titles"
            );
        }

        Self {
            records,
            folded,
            by_folded,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact, case-insensitive lookup of a title's row index
    pub fn resolve(&self, query: &str) -> Option<usize> {
        self.by_folded.get(&fold_case(query)).copied()
    }

    /// All titles containing `query` (case-insensitive), in registry order
    pub fn suggest(&self, query: &str) -> Vec<Title> {
        let needle = fold_case(query);

        self.folded
            .iter()
            .enumerate()
            .filter(|(_, folded)| folded.contains(&needle))
            .map(|(index, _)| self.title_at(index))
            .collect()
    }

    /// Returns the title stored at `row_index`
    pub fn materialize(&self, row_index: usize) -> AppResult<Title> {
        if row_index >= self.records.len() {
            return Err(AppError::InvalidIndex {
                index: row_index,
                len: self.records.len(),
            });
        }
        Ok(self.title_at(row_index))
    }

    /// Case-folded form of the title at `row_index`
    pub fn folded_title(&self, row_index: usize) -> Option<&str> {
        self.folded.get(row_index).map(String::as_str)
    }

    fn title_at(&self, index: usize) -> Title {
        let record = &self.records[index];
        Title {
            row_index: index,
            title: record.title.clone(),
            external_id: record.external_id.clone(),
        }
    }
}
