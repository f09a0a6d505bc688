/// Read-through caching for provider calls.
///
/// Looks `$key` up in `$cache`; on a hit the cached value is the result. On a
/// miss, or when the cache read itself fails, `$block` is awaited and a
/// successful value is queued for storage with `$ttl` seconds to live.
/// Evaluates to `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let details: MovieDetails = cached!(self.cache, CacheKey::Details(id.to_string()), TTL, async {
///     self.fetch_details(id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, fetching from source");
                }
                match $block.await {
                    Ok(value) => {
                        $cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}
