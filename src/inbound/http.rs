//! HTTP surface: `GET /{user}?page=N&per_page=M`.
//!
//! Parses the path and pagination, reads the optional `GITHUB_TOKEN`
//! header, and hands the query to the relay. Errors render through
//! [`RelayError`]'s `IntoResponse` impl.

use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use url::form_urlencoded;

use crate::core::relay::GistRelay;
use crate::domain::model::GistQuery;
use crate::domain::ports::GistSource;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::MAX_PER_PAGE;

/// 呼叫端提供 GitHub token 的標頭 (名稱不分大小寫)
pub const TOKEN_HEADER: &str = "github_token";
const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

pub struct AppState<S: GistSource> {
    pub relay: GistRelay<S>,
    pub default_page: u32,
    pub default_per_page: u32,
}

impl<S: GistSource> AppState<S> {
    pub fn new(relay: GistRelay<S>) -> Self {
        Self {
            relay,
            default_page: 1,
            default_per_page: 5,
        }
    }

    pub fn with_defaults(mut self, page: u32, per_page: u32) -> Self {
        self.default_page = page;
        self.default_per_page = per_page;
        self
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl PaginationParams {
    /// 同名參數重複時取第一個，其餘參數忽略
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        for (name, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match name.as_ref() {
                "page" => &mut params.page,
                "per_page" => &mut params.per_page,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// 缺少或空白的參數使用預設值；其餘必須是合法正整數
    pub fn resolve(&self, user: String, default_page: u32, default_per_page: u32) -> Result<GistQuery> {
        let page = parse_param("page", self.page.as_deref(), default_page, u32::MAX)?;
        let per_page = parse_param(
            "per_page",
            self.per_page.as_deref(),
            default_per_page,
            MAX_PER_PAGE,
        )?;
        Ok(GistQuery::new(user, page, per_page))
    }
}

fn parse_param(field: &'static str, raw: Option<&str>, default: u32, max: u32) -> Result<u32> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };

    match raw.parse::<u32>() {
        Ok(value) if (1..=max).contains(&value) => Ok(value),
        _ => Err(RelayError::InvalidPagination {
            field,
            value: raw.to_string(),
        }),
    }
}

pub fn router<S: GistSource + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(missing_user))
        .route("/{user}", get(user_gists::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn missing_user() -> RelayError {
    RelayError::MissingUser
}

async fn user_gists<S: GistSource + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user): Path<String>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Result<Response> {
    if user.is_empty() {
        return Err(RelayError::MissingUser);
    }

    let params = PaginationParams::from_query(raw_query.as_deref());
    let query = params.resolve(user, state.default_page, state.default_per_page)?;
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let relayed = state.relay.fetch(&query, token).await?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/json"),
            (X_CACHE, relayed.cache_status.as_header_value()),
        ],
        relayed.payload.body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::ResponseCache;
    use crate::domain::model::{GistPayload, UpstreamFailure};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    type Seen = Arc<Mutex<Vec<(GistQuery, Option<String>)>>>;

    struct StubSource {
        outcome: std::result::Result<GistPayload, UpstreamFailure>,
        seen: Seen,
    }

    #[async_trait]
    impl GistSource for StubSource {
        async fn fetch_gists(
            &self,
            query: &GistQuery,
            token: Option<&str>,
        ) -> std::result::Result<GistPayload, UpstreamFailure> {
            self.seen
                .lock()
                .unwrap()
                .push((query.clone(), token.map(str::to_string)));
            self.outcome.clone()
        }
    }

    fn app(outcome: std::result::Result<GistPayload, UpstreamFailure>) -> (Router, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let source = StubSource {
            outcome,
            seen: seen.clone(),
        };
        let relay = GistRelay::new(source)
            .with_cache(ResponseCache::new(Duration::from_secs(60), 16));
        (router(Arc::new(AppState::new(relay))), seen)
    }

    fn ok_app() -> (Router, Seen) {
        app(Ok(GistPayload::new(r#"[{"id":"aa5a315d61ae9438b18d"}]"#)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_user_is_bad_request() {
        let (app, seen) = ok_app();
        let (status, headers, body) = send(app, get_request("/")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "user not specified\n");
        assert_eq!(headers[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relays_body_verbatim_with_defaults() {
        let (app, seen) = ok_app();
        let (status, headers, body) = send(app, get_request("/octocat")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["x-cache"], "MISS");
        assert_eq!(body, r#"[{"id":"aa5a315d61ae9438b18d"}]"#);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, GistQuery::new("octocat", 1, 5));
        assert_eq!(seen[0].1, None);
    }

    #[tokio::test]
    async fn test_explicit_and_empty_pagination() {
        let (app, seen) = ok_app();
        send(app.clone(), get_request("/octocat?page=3&per_page=50")).await;
        send(app, get_request("/octocat?page=&per_page=")).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, GistQuery::new("octocat", 3, 50));
        assert_eq!(seen[1].0, GistQuery::new("octocat", 1, 5));
    }

    #[tokio::test]
    async fn test_configured_defaults_apply() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let source = StubSource {
            outcome: Ok(GistPayload::new("[]")),
            seen: seen.clone(),
        };
        let state = AppState::new(GistRelay::new(source)).with_defaults(2, 10);
        send(router(Arc::new(state)), get_request("/octocat")).await;

        assert_eq!(seen.lock().unwrap()[0].0, GistQuery::new("octocat", 2, 10));
    }

    #[tokio::test]
    async fn test_invalid_pagination_is_rejected() {
        for (uri, expected) in [
            ("/octocat?page=abc", "invalid page\n"),
            ("/octocat?page=0", "invalid page\n"),
            ("/octocat?page=-1", "invalid page\n"),
            ("/octocat?per_page=101", "invalid per_page\n"),
            ("/octocat?per_page=0", "invalid per_page\n"),
        ] {
            let (app, seen) = ok_app();
            let (status, _, body) = send(app, get_request(uri)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body, expected, "{}", uri);
            assert!(seen.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_repeated_params_use_first_value() {
        let (app, seen) = ok_app();
        let (status, _, _) = send(app.clone(), get_request("/octocat?page=1&page=2")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(
            app,
            get_request("/octocat?per_page=10&per_page=abc&page=3&page=x"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, GistQuery::new("octocat", 1, 5));
        assert_eq!(seen[1].0, GistQuery::new("octocat", 3, 10));
    }

    #[test]
    fn test_pagination_params_from_query() {
        assert_eq!(PaginationParams::from_query(None), PaginationParams::default());
        assert_eq!(
            PaginationParams::from_query(Some("per_page=%32%30&sort=asc&page=&page=9")),
            PaginationParams {
                page: Some(String::new()),
                per_page: Some("20".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_token_header_is_forwarded() {
        let (app, seen) = ok_app();
        let request = Request::builder()
            .uri("/octocat")
            .header("GITHUB_TOKEN", "ghp_example")
            .body(Body::empty())
            .unwrap();
        send(app.clone(), request).await;

        let blank = Request::builder()
            .uri("/octocat?page=2")
            .header("GITHUB_TOKEN", "  ")
            .body(Body::empty())
            .unwrap();
        send(app, blank).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1.as_deref(), Some("ghp_example"));
        assert_eq!(seen[1].1, None);
    }

    #[tokio::test]
    async fn test_upstream_status_is_mirrored() {
        let (app, _) = app(Err(UpstreamFailure::Status {
            status: 404,
            retry_after: None,
            rate_limited: false,
        }));
        let (status, _, body) = send(app, get_request("/ghost")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "GitHub API error\n");
    }

    #[tokio::test]
    async fn test_transport_failure_is_bad_gateway() {
        let (app, _) = app(Err(UpstreamFailure::Transport("refused".to_string())));
        let (status, _, body) = send(app, get_request("/octocat")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, "failed to contact GitHub\n");
    }

    #[tokio::test]
    async fn test_body_failure_is_internal_error() {
        let (app, _) = app(Err(UpstreamFailure::Body("connection reset".to_string())));
        let (status, _, body) = send(app, get_request("/octocat")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "failed to read response\n");
    }

    #[tokio::test]
    async fn test_second_request_is_cache_hit() {
        let (app, seen) = ok_app();
        send(app.clone(), get_request("/octocat")).await;
        let (status, headers, _) = send(app, get_request("/octocat")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["x-cache"], "HIT");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nested_path_is_not_found() {
        let (app, seen) = ok_app();
        let (status, _, _) = send(app, get_request("/octocat/extra")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_param_bounds() {
        assert_eq!(parse_param("page", None, 1, u32::MAX).unwrap(), 1);
        assert_eq!(parse_param("page", Some(" 7 "), 1, u32::MAX).unwrap(), 7);
        assert_eq!(parse_param("per_page", Some("100"), 5, MAX_PER_PAGE).unwrap(), 100);
        assert!(parse_param("per_page", Some("1.5"), 5, MAX_PER_PAGE).is_err());
    }
}
