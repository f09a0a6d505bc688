use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    TitleSearch(String),
    Details(String),
    Credits(String),
    Videos(String),
    DiscoverGenre(u32),
    DiscoverProvider(u32, String),
    Popular,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TitleSearch(query) => write!(f, "tmdb:search:{}", query.to_lowercase()),
            CacheKey::Details(id) => write!(f, "tmdb:details:{}", id),
            CacheKey::Credits(id) => write!(f, "tmdb:credits:{}", id),
            CacheKey::Videos(id) => write!(f, "tmdb:videos:{}", id),
            CacheKey::DiscoverGenre(genre) => write!(f, "tmdb:discover:genre:{}", genre),
            CacheKey::DiscoverProvider(provider, region) => write!(
                f,
                "tmdb:discover:provider:{}:{}",
                provider,
                region.to_uppercase()
            ),
            CacheKey::Popular => write!(f, "tmdb:popular"),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

#[derive(Clone)]
struct Backend {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Metadata cache backed by Redis.
///
/// A disabled cache misses on every read and drops every write, which lets
/// providers run unchanged when no Redis is configured.
#[derive(Clone)]
pub struct Cache {
    backend: Option<Backend>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and stop
    pub async fn shutdown(self) {
        if let Some(shutdown_tx) = self.shutdown_tx {
            let _ = shutdown_tx.send(()).await;
            tracing::info!("Cache writer shutdown signal sent");
        }
    }
}

impl Cache {
    /// Creates a cache and spawns its background writer task
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            backend: Some(Backend {
                redis_client,
                write_tx,
            }),
        };

        (
            cache,
            CacheWriterHandle {
                shutdown_tx: Some(shutdown_tx),
            },
        )
    }

    /// A cache that never stores anything
    pub fn disabled() -> (Self, CacheWriterHandle) {
        (Self { backend: None }, CacheWriterHandle { shutdown_tx: None })
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Drains write messages until shutdown, then flushes what is left
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::warn!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0;
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::warn!(error = %e, "Failed to flush cache write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }
                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` on a miss or when the cache is disabled.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let Some(backend) = &self.backend else {
            return Ok(None);
        };

        let mut conn = backend.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for storage without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let Some(backend) = &self.backend else {
            return;
        };

        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = backend.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_title_search_lowercase() {
        let key = CacheKey::TitleSearch("THE MATRIX".to_string());
        assert_eq!(key.to_string(), "tmdb:search:the matrix");
    }

    #[test]
    fn test_cache_key_display_by_id() {
        assert_eq!(CacheKey::Details("27205".to_string()).to_string(), "tmdb:details:27205");
        assert_eq!(CacheKey::Credits("27205".to_string()).to_string(), "tmdb:credits:27205");
        assert_eq!(CacheKey::Videos("27205".to_string()).to_string(), "tmdb:videos:27205");
    }

    #[test]
    fn test_cache_key_display_discover() {
        assert_eq!(CacheKey::DiscoverGenre(28).to_string(), "tmdb:discover:genre:28");
        assert_eq!(
            CacheKey::DiscoverProvider(8, "us".to_string()).to_string(),
            "tmdb:discover:provider:8:US"
        );
        assert_eq!(CacheKey::Popular.to_string(), "tmdb:popular");
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let (cache, handle) = Cache::disabled();
        let key = CacheKey::Details("603".to_string());

        cache.set_in_background(&key, &vec!["ignored".to_string()], 60);
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();

        assert!(!cache.is_enabled());
        assert_eq!(retrieved, None);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_error() {
        // Port 1 is never a Redis server; the read fails instead of hanging
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client);

        let key = CacheKey::Popular;
        let result: AppResult<Option<Vec<String>>> = cache.get_from_cache(&key).await;

        assert!(cache.is_enabled());
        assert!(matches!(result, Err(AppError::Cache(_))));
        handle.shutdown().await;
    }
}
