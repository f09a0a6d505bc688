/// Metadata provider abstraction
///
/// The recommendation core only knows titles and external ids. Everything a
/// client displays (posters, genres, cast, trailers) comes from a catalog
/// service behind this trait, so it can be swapped or mocked.
use crate::{
    error::AppResult,
    models::{CastMember, ExternalId, MovieDetails, MovieSummary},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Best match for a title, used when the artifact carries no external id
    async fn search_by_title(&self, title: &str) -> AppResult<Option<MovieSummary>>;

    /// Genres, release date, rating, overview and poster for one title
    async fn get_details(&self, id: &ExternalId) -> AppResult<MovieDetails>;

    /// Top `limit` billed cast members
    async fn get_credits(&self, id: &ExternalId, limit: usize) -> AppResult<Vec<CastMember>>;

    /// URL of the first trailer hosted on YouTube, if any
    async fn get_videos(&self, id: &ExternalId) -> AppResult<Option<String>>;

    /// Most popular titles in a genre
    async fn discover_by_genre(&self, genre_id: u32) -> AppResult<Vec<MovieSummary>>;

    /// Most popular titles offered by a watch provider in a region
    async fn discover_by_provider(
        &self,
        provider_id: u32,
        region: &str,
    ) -> AppResult<Vec<MovieSummary>>;

    /// Currently popular titles
    async fn popular(&self) -> AppResult<Vec<MovieSummary>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
