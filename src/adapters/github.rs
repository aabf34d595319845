//! Reqwest-backed GitHub gist source.
//!
//! Owns transport details only: URL construction, identity headers, the
//! request timeout, and mapping of transport/status/body failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::domain::model::{GistPayload, GistQuery, UpstreamFailure};
use crate::domain::ports::{ConfigProvider, GistSource};
use crate::utils::error::{RelayError, Result};

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("gist-relay/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

pub struct GithubGistSource {
    client: Client,
    base_url: Url,
}

impl GithubGistSource {
    /// Build a source with an explicit base URL, timeout and user agent.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| RelayError::InvalidConfigValueError {
            field: "upstream_base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RelayError::InvalidConfigValueError {
                field: "upstream_base_url".to_string(),
                value: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RelayError::RequestBuildError {
                message: format!("HTTP client construction failed: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::new(
            config.upstream_base_url(),
            config.request_timeout(),
            config.user_agent(),
        )
    }

    /// `{base}/users/{user}/gists?page=N&per_page=M`，使用者名稱當成單一路徑片段編碼
    pub fn gists_url(&self, query: &GistQuery) -> std::result::Result<Url, UpstreamFailure> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamFailure::Build("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["users", query.user.as_str(), "gists"]);
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &query.page.to_string())
            .append_pair("per_page", &query.per_page.to_string());
        Ok(url)
    }
}

#[async_trait]
impl GistSource for GithubGistSource {
    async fn fetch_gists(
        &self,
        query: &GistQuery,
        token: Option<&str>,
    ) -> std::result::Result<GistPayload, UpstreamFailure> {
        let url = self.gists_url(query)?;
        tracing::debug!("📡 GET {}", url);

        let mut request = self.client.get(url).header(ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();
        tracing::debug!("📡 upstream status: {}", status);

        if status != StatusCode::OK {
            return Err(map_status(status, response.headers()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamFailure::Body(e.to_string()))?;
        Ok(GistPayload::new(body))
    }
}

fn map_send_error(error: reqwest::Error) -> UpstreamFailure {
    if error.is_builder() {
        UpstreamFailure::Build(error.to_string())
    } else {
        UpstreamFailure::Transport(error.to_string())
    }
}

fn map_status(status: StatusCode, headers: &HeaderMap) -> UpstreamFailure {
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let rate_limited = headers
        .get(RATE_LIMIT_REMAINING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");

    UpstreamFailure::Status {
        status: status.as_u16(),
        retry_after,
        rate_limited,
    }
}
