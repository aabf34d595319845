use axum::body::Bytes;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// 一次 gist 清單查詢：使用者加上分頁參數
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GistQuery {
    pub user: String,
    pub page: u32,
    pub per_page: u32,
}

impl GistQuery {
    pub fn new(user: impl Into<String>, page: u32, per_page: u32) -> Self {
        Self {
            user: user.into(),
            page,
            per_page,
        }
    }
}

/// 上游回傳的原始 JSON 本文，原封不動轉給客戶端
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistPayload {
    pub body: Bytes,
}

impl GistPayload {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Cache and coalescing key. Holds a hash of the token, never the token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: GistQuery,
    pub token_fingerprint: Option<u64>,
}

impl CacheKey {
    pub fn new(query: &GistQuery, token: Option<&str>) -> Self {
        Self {
            query: query.clone(),
            token_fingerprint: token.map(fingerprint),
        }
    }
}

fn fingerprint(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

/// 上游呼叫失敗的原因。可 Clone，好讓合併中的請求共享同一結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    Build(String),
    Transport(String),
    Status {
        status: u16,
        retry_after: Option<Duration>,
        rate_limited: bool,
    },
    Body(String),
}

impl UpstreamFailure {
    /// 是否值得重試：連線錯誤、5xx、429，以及配額耗盡的 403
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamFailure::Transport(_) => true,
            UpstreamFailure::Status {
                status,
                rate_limited,
                ..
            } => *status >= 500 || *status == 429 || (*status == 403 && *rate_limited),
            UpstreamFailure::Build(_) | UpstreamFailure::Body(_) => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            UpstreamFailure::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// 回應是否來自快取
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}
