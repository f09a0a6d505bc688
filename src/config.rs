use serde::Deserialize;
use std::time::Duration;

use crate::services::recommendations::DEFAULT_RECOMMENDATIONS;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the precomputed similarity artifact (`.json` or `.bin`)
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,

    /// TMDb API key
    pub tmdb_api_key: String,

    /// TMDb API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL posters are served from
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Redis connection URL. Metadata caching is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the caller does not ask for a count
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Cast members kept per title
    #[serde(default = "default_cast_limit")]
    pub cast_limit: usize,

    /// Timeout for a single metadata call
    #[serde(default = "default_enrichment_timeout_secs")]
    pub enrichment_timeout_secs: u64,

    /// Deadline for enriching a whole result set
    #[serde(default = "default_enrichment_deadline_secs")]
    pub enrichment_deadline_secs: u64,

    /// Extra attempts for a metadata call that failed transiently
    #[serde(default = "default_enrichment_retries")]
    pub enrichment_retries: u32,

    /// Base pause between retries, grows linearly with the attempt number
    #[serde(default = "default_enrichment_retry_backoff_ms")]
    pub enrichment_retry_backoff_ms: u64,
}

fn default_artifact_path() -> String {
    "data/similarity.json".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_count() -> usize {
    DEFAULT_RECOMMENDATIONS
}

fn default_cast_limit() -> usize {
    5
}

fn default_enrichment_timeout_secs() -> u64 {
    10
}

fn default_enrichment_deadline_secs() -> u64 {
    15
}

fn default_enrichment_retries() -> u32 {
    1
}

fn default_enrichment_retry_backoff_ms() -> u64 {
    250
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn enrichment_timeout(&self) -> Duration {
        Duration::from_secs(self.enrichment_timeout_secs)
    }

    pub fn enrichment_deadline(&self) -> Duration {
        Duration::from_secs(self.enrichment_deadline_secs)
    }

    pub fn enrichment_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.enrichment_retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let vars = vec![("TMDB_API_KEY".to_string(), "secret".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.tmdb_api_key, "secret");
        assert_eq!(config.artifact_path, "data/similarity.json");
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.port, 3000);
        assert_eq!(config.recommendation_count, 5);
        assert_eq!(config.enrichment_timeout(), Duration::from_secs(10));
        assert_eq!(config.enrichment_retries, 1);
        assert_eq!(config.enrichment_retry_backoff(), Duration::from_millis(250));
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("TMDB_API_KEY".to_string(), "secret".to_string()),
            ("REDIS_URL".to_string(), "redis://cache:6379".to_string()),
            ("ARTIFACT_PATH".to_string(), "/srv/movies.bin".to_string()),
            ("ENRICHMENT_DEADLINE_SECS".to_string(), "3".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.artifact_path, "/srv/movies.bin");
        assert_eq!(config.enrichment_deadline(), Duration::from_secs(3));
    }

    #[test]
    fn test_missing_api_key_fails() {
        let vars: Vec<(String, String)> = vec![];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
