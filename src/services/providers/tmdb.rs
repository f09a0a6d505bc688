/// TMDb (The Movie Database) metadata provider
///
/// API Flow:
/// 1. Title search: /search/movie → TMDb id + poster path
/// 2. Details: /movie/{id}, /movie/{id}/credits, /movie/{id}/videos
/// 3. Listings: /discover/movie (by genre or watch provider), /movie/popular
///
/// Every request carries `api_key` and `language` query parameters.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        CastMember, ExternalId, MovieDetails, MovieSummary, TmdbCredits, TmdbMovie,
        TmdbMovieDetails, TmdbPage, TmdbVideo,
    },
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const TITLE_CACHE_TTL: u64 = 604800; // 1 week
const LISTING_CACHE_TTL: u64 = 3600; // 1 hour
const DISCOVER_LIMIT: usize = 10;
const POPULAR_LIMIT: usize = 5;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Cache,
}

impl TmdbProvider {
    /// Creates a provider whose HTTP client gives up on a request after `timeout`
    pub fn new(
        cache: Cache,
        api_key: String,
        api_url: String,
        language: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            cache,
        })
    }

    /// Performs a GET against the API and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(path = %path, status = %status, "TMDb request failed");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to deserialize TMDb response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDb response: {}", e))
        })
    }

    async fn fetch_listing(
        &self,
        path: &str,
        params: &[(&str, &str)],
        limit: usize,
    ) -> AppResult<Vec<MovieSummary>> {
        let page: TmdbPage<TmdbMovie> = self.get_json(path, params).await?;
        Ok(page
            .results
            .into_iter()
            .take(limit)
            .map(MovieSummary::from)
            .collect())
    }

    fn first_trailer(videos: Vec<TmdbVideo>) -> Option<String> {
        videos
            .iter()
            .find(|video| video.is_youtube_trailer())
            .map(TmdbVideo::youtube_url)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search_by_title(&self, title: &str) -> AppResult<Option<MovieSummary>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::TitleSearch(title.to_string()),
            SEARCH_CACHE_TTL,
            async {
                let page: TmdbPage<TmdbMovie> =
                    self.get_json("/search/movie", &[("query", title)]).await?;

                let best = page.results.into_iter().next().map(MovieSummary::from);

                tracing::info!(
                    query = %title,
                    found = best.is_some(),
                    provider = "tmdb",
                    "Title search completed"
                );

                Ok::<_, AppError>(best)
            }
        )
    }

    async fn get_details(&self, id: &ExternalId) -> AppResult<MovieDetails> {
        cached!(
            self.cache,
            CacheKey::Details(id.to_string()),
            TITLE_CACHE_TTL,
            async {
                let details: TmdbMovieDetails =
                    self.get_json(&format!("/movie/{}", id), &[]).await?;
                Ok::<_, AppError>(MovieDetails::from(details))
            }
        )
    }

    async fn get_credits(&self, id: &ExternalId, limit: usize) -> AppResult<Vec<CastMember>> {
        let cast: Vec<CastMember> = cached!(
            self.cache,
            CacheKey::Credits(id.to_string()),
            TITLE_CACHE_TTL,
            async {
                let credits: TmdbCredits =
                    self.get_json(&format!("/movie/{}/credits", id), &[]).await?;
                Ok::<_, AppError>(credits.cast.into_iter().map(CastMember::from).collect::<Vec<_>>())
            }
        )?;

        Ok(cast.into_iter().take(limit).collect())
    }

    async fn get_videos(&self, id: &ExternalId) -> AppResult<Option<String>> {
        cached!(
            self.cache,
            CacheKey::Videos(id.to_string()),
            TITLE_CACHE_TTL,
            async {
                let page: TmdbPage<TmdbVideo> =
                    self.get_json(&format!("/movie/{}/videos", id), &[]).await?;
                Ok::<_, AppError>(Self::first_trailer(page.results))
            }
        )
    }

    async fn discover_by_genre(&self, genre_id: u32) -> AppResult<Vec<MovieSummary>> {
        cached!(
            self.cache,
            CacheKey::DiscoverGenre(genre_id),
            LISTING_CACHE_TTL,
            async {
                let genre = genre_id.to_string();
                self.fetch_listing(
                    "/discover/movie",
                    &[
                        ("with_genres", genre.as_str()),
                        ("sort_by", "popularity.desc"),
                        ("page", "1"),
                    ],
                    DISCOVER_LIMIT,
                )
                .await
            }
        )
    }

    async fn discover_by_provider(
        &self,
        provider_id: u32,
        region: &str,
    ) -> AppResult<Vec<MovieSummary>> {
        cached!(
            self.cache,
            CacheKey::DiscoverProvider(provider_id, region.to_string()),
            LISTING_CACHE_TTL,
            async {
                let provider = provider_id.to_string();
                let region = region.to_uppercase();
                self.fetch_listing(
                    "/discover/movie",
                    &[
                        ("with_watch_providers", provider.as_str()),
                        ("watch_region", region.as_str()),
                        ("sort_by", "popularity.desc"),
                        ("page", "1"),
                    ],
                    DISCOVER_LIMIT,
                )
                .await
            }
        )
    }

    async fn popular(&self) -> AppResult<Vec<MovieSummary>> {
        cached!(self.cache, CacheKey::Popular, LISTING_CACHE_TTL, async {
            self.fetch_listing("/movie/popular", &[("page", "1")], POPULAR_LIMIT)
                .await
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
