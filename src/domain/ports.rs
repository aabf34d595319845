use crate::domain::model::{GistPayload, GistQuery, UpstreamFailure};
use async_trait::async_trait;
use std::time::Duration;

/// 上游 gist 來源。實作只負責一次呼叫，重試與快取由 relay 處理
#[async_trait]
pub trait GistSource: Send + Sync {
    async fn fetch_gists(
        &self,
        query: &GistQuery,
        token: Option<&str>,
    ) -> std::result::Result<GistPayload, UpstreamFailure>;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_address(&self) -> &str;
    fn upstream_base_url(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn default_page(&self) -> u32;
    fn default_per_page(&self) -> u32;
    fn cache_ttl(&self) -> Duration;
    fn cache_capacity(&self) -> usize;
    fn max_concurrent_upstream(&self) -> usize;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn max_retry_delay(&self) -> Duration;
}
