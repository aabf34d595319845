use crate::core::cache::ResponseCache;
use crate::core::coalesce::{FetchOutcome, RequestCoalescer};
use crate::domain::model::{CacheKey, CacheStatus, GistPayload, GistQuery, UpstreamFailure};
use crate::domain::ports::{ConfigProvider, GistSource};
use crate::utils::error::Result;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const DEFAULT_MAX_CONCURRENT_UPSTREAM: usize = 5;

/// 重試策略。attempts 為 0 時只呼叫一次上游
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    /// 優先採用上游的 Retry-After，上限為 max_delay
    pub fn delay_for(&self, failure: &UpstreamFailure) -> Duration {
        failure
            .retry_after()
            .unwrap_or(self.delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub payload: GistPayload,
    pub cache_status: CacheStatus,
}

/// Cache lookup, then a coalesced and permit-bounded upstream call with retries.
pub struct GistRelay<S: GistSource> {
    source: S,
    cache: ResponseCache,
    coalescer: RequestCoalescer,
    permits: Semaphore,
    retry: RetryPolicy,
}

impl<S: GistSource> GistRelay<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: ResponseCache::disabled(),
            coalescer: RequestCoalescer::new(),
            permits: Semaphore::new(DEFAULT_MAX_CONCURRENT_UPSTREAM),
            retry: RetryPolicy::none(),
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(source: S, config: &C) -> Self {
        Self::new(source)
            .with_cache(ResponseCache::new(config.cache_ttl(), config.cache_capacity()))
            .with_max_concurrent_upstream(config.max_concurrent_upstream())
            .with_retry(RetryPolicy {
                attempts: config.retry_attempts(),
                delay: config.retry_delay(),
                max_delay: config.max_retry_delay(),
            })
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_max_concurrent_upstream(mut self, limit: usize) -> Self {
        self.permits = Semaphore::new(limit.max(1));
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub async fn fetch(&self, query: &GistQuery, token: Option<&str>) -> Result<RelayResponse> {
        let token = token.filter(|t| !t.is_empty());
        let key = CacheKey::new(query, token);

        if let Some(payload) = self.cache.get(&key).await {
            tracing::debug!(
                "💾 cache hit: user={} page={} per_page={}",
                query.user,
                query.page,
                query.per_page
            );
            return Ok(RelayResponse {
                payload,
                cache_status: CacheStatus::Hit,
            });
        }

        // leader 在釋放 in-flight 項目前先寫入快取，之後的請求不會再打上游
        let cache_key = key.clone();
        let coalesced = self
            .coalescer
            .execute(key, move || async move {
                let outcome = self.fetch_with_retry(query, token).await;
                if let Ok(payload) = &outcome {
                    self.cache.insert(cache_key, payload.clone()).await;
                }
                outcome
            })
            .await;

        let payload = coalesced.outcome?;

        tracing::info!(
            "✅ relayed gists: user={} page={} per_page={} bytes={} shared={}",
            query.user,
            query.page,
            query.per_page,
            payload.len(),
            coalesced.shared
        );

        Ok(RelayResponse {
            payload,
            cache_status: CacheStatus::Miss,
        })
    }

    async fn fetch_with_retry(&self, query: &GistQuery, token: Option<&str>) -> FetchOutcome {
        let mut attempt = 0;
        loop {
            let outcome = {
                let _permit = self.permits.acquire().await.map_err(|_| {
                    UpstreamFailure::Transport("upstream permits closed".to_string())
                })?;
                self.source.fetch_gists(query, token).await
            };

            match outcome {
                Err(failure) if failure.is_retryable() && attempt < self.retry.attempts => {
                    attempt += 1;
                    let delay = self.retry.delay_for(&failure);
                    tracing::warn!(
                        "🔄 upstream failure for {} ({:?}), retry {}/{} in {:?}",
                        query.user,
                        failure,
                        attempt,
                        self.retry.attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
