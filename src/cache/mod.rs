//! Short-TTL lookup cache, which doubles as the dedup point: concurrent
//! lookups for the same key share a single in-flight fetch instead of each
//! hitting the upstream site.

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::error::ScrapeError;
use crate::models::PlayerRecord;

/// Keys are case-folded usernames; callers fold before reaching this layer.
pub struct PlayerCache {
    inner: Cache<String, Arc<PlayerRecord>>,
}

impl PlayerCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<PlayerRecord>> {
        self.inner.get(key).await
    }

    /// Returns the cached record or runs `fetch` to populate it. While one
    /// fetch for `key` is in flight, every concurrent caller awaits that
    /// same fetch. A failed fetch reaches all waiters and is not cached,
    /// so the next lookup tries again.
    pub async fn get_or_fetch<F>(
        &self,
        key: &str,
        fetch: F,
    ) -> Result<Arc<PlayerRecord>, Arc<ScrapeError>>
    where
        F: Future<Output = Result<Arc<PlayerRecord>, ScrapeError>>,
    {
        self.inner.try_get_with(key.to_string(), fetch).await
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
