use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, timeout_at, Instant};

use crate::{
    error::{AppError, AppResult},
    models::{poster_url, EnrichedTitle, ExternalId, MovieSummary, ScoredTitle},
    services::providers::MetadataProvider,
};

/// Something to decorate with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentTarget {
    pub title: String,
    pub external_id: Option<ExternalId>,
    pub score: Option<f32>,
    pub poster_path: Option<String>,
}

impl From<ScoredTitle> for EnrichmentTarget {
    fn from(scored: ScoredTitle) -> Self {
        Self {
            title: scored.title.title,
            external_id: scored.title.external_id,
            score: Some(scored.score),
            poster_path: None,
        }
    }
}

impl From<MovieSummary> for EnrichmentTarget {
    fn from(summary: MovieSummary) -> Self {
        Self {
            title: summary.title,
            external_id: Some(summary.id),
            score: None,
            poster_path: summary.poster_path,
        }
    }
}

/// Timeouts and limits applied to metadata calls
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub call_timeout: Duration,
    pub deadline: Duration,
    pub retries: u32,
    /// Pause before retry `n` is `n * retry_backoff`
    pub retry_backoff: Duration,
    pub cast_limit: usize,
    pub image_base_url: String,
}

/// Decorates titles with metadata, one task per title.
///
/// Each provider call runs under its own timeout and is retried on transient
/// failures. A failed call only blanks the fields it would have filled; the
/// title itself is always returned.
#[derive(Clone)]
pub struct EnrichmentService {
    provider: Arc<dyn MetadataProvider>,
    settings: Arc<EnrichmentSettings>,
}

impl EnrichmentService {
    pub fn new(provider: Arc<dyn MetadataProvider>, settings: EnrichmentSettings) -> Self {
        Self {
            provider,
            settings: Arc::new(settings),
        }
    }

    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    pub fn image_base_url(&self) -> &str {
        &self.settings.image_base_url
    }

    /// Enriches every target concurrently, preserving input order.
    ///
    /// Titles whose task has not finished by the overall deadline are
    /// returned without metadata.
    pub async fn enrich_all(&self, targets: Vec<EnrichmentTarget>) -> Vec<EnrichedTitle> {
        let deadline = Instant::now() + self.settings.deadline;
        let total = targets.len();

        let mut tasks = Vec::with_capacity(total);
        for target in targets {
            let service = self.clone();
            let fallback = target.clone();
            let task = tokio::spawn(async move { service.enrich_one(target).await });
            tasks.push((fallback, task));
        }

        let mut results = Vec::with_capacity(total);
        let mut degraded = 0;

        for (fallback, mut task) in tasks {
            match timeout_at(deadline, &mut task).await {
                Ok(Ok(enriched)) => results.push(enriched),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, title = %fallback.title, "Enrichment task failed");
                    degraded += 1;
                    results.push(bare(fallback, &self.settings.image_base_url));
                }
                Err(_) => {
                    task.abort();
                    tracing::warn!(title = %fallback.title, "Enrichment deadline exceeded");
                    degraded += 1;
                    results.push(bare(fallback, &self.settings.image_base_url));
                }
            }
        }

        if degraded > 0 {
            tracing::warn!(
                total,
                degraded,
                provider = self.provider.name(),
                "Partial enrichment"
            );
        }

        results
    }

    /// Enriches a single title. Never fails; missing data stays empty.
    pub async fn enrich_one(&self, target: EnrichmentTarget) -> EnrichedTitle {
        let mut poster_path = target.poster_path.clone();

        let external_id = match target.external_id.clone() {
            Some(id) => Some(id),
            None => {
                let found = self
                    .guarded("search_by_title", &target.title, || {
                        self.provider.search_by_title(&target.title)
                    })
                    .await
                    .flatten();
                found.map(|summary| {
                    poster_path = poster_path.take().or(summary.poster_path);
                    summary.id
                })
            }
        };

        let mut enriched =
            EnrichedTitle::bare(target.title.clone(), external_id.clone(), target.score);

        let Some(id) = external_id else {
            tracing::debug!(title = %target.title, "No external id, returning bare title");
            enriched.poster_url =
                poster_path.map(|p| poster_url(&self.settings.image_base_url, &p));
            return enriched;
        };

        let title = target.title.as_str();
        let cast_limit = self.settings.cast_limit;
        let (details, cast, trailer) = tokio::join!(
            self.guarded("get_details", title, || self.provider.get_details(&id)),
            self.guarded("get_credits", title, || self.provider.get_credits(&id, cast_limit)),
            self.guarded("get_videos", title, || self.provider.get_videos(&id)),
        );

        if let Some(details) = details {
            poster_path = poster_path.or(details.poster_path);
            enriched.genres = details.genres;
            enriched.release_date = details.release_date;
            enriched.rating = details.rating;
            enriched.overview = details.overview;
        }
        enriched.poster_url = poster_path.map(|p| poster_url(&self.settings.image_base_url, &p));
        enriched.cast = cast
            .unwrap_or_default()
            .into_iter()
            .map(|member| member.name)
            .collect();
        enriched.trailer_url = trailer.flatten();

        enriched
    }

    /// Runs one provider call with timeout and retries, logging and
    /// swallowing the failure
    async fn guarded<T, F, Fut>(&self, operation: &'static str, title: &str, call: F) -> Option<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let attempts = self.settings.retries + 1;

        for attempt in 1..=attempts {
            let error = match timeout(self.settings.call_timeout, call()).await {
                Ok(Ok(value)) => return Some(value),
                Ok(Err(e)) => e,
                Err(_) => AppError::Timeout(format!(
                    "{} after {:?}",
                    operation, self.settings.call_timeout
                )),
            };

            let retry = attempt < attempts && error.is_transient();
            tracing::warn!(
                error = %error,
                operation,
                title = %title,
                attempt,
                retry,
                "Metadata call failed"
            );
            if !retry {
                break;
            }
            tokio::time::sleep(self.settings.retry_backoff * attempt).await;
        }

        None
    }
}

fn bare(target: EnrichmentTarget, image_base_url: &str) -> EnrichedTitle {
    let mut enriched = EnrichedTitle::bare(target.title, target.external_id, target.score);
    enriched.poster_url = target.poster_path.map(|p| poster_url(image_base_url, &p));
    enriched
}
