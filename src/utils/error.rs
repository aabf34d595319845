use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::domain::model::UpstreamFailure;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("user not specified")]
    MissingUser,

    #[error("invalid {field}: {value}")]
    InvalidPagination { field: &'static str, value: String },

    #[error("failed to create request: {message}")]
    RequestBuildError { message: String },

    #[error("failed to contact GitHub: {message}")]
    UpstreamUnavailable { message: String },

    #[error("GitHub API error: status {status}")]
    UpstreamStatus { status: u16 },

    #[error("failed to read response: {message}")]
    BodyReadError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Upstream,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RelayError {
    /// 對應回傳給客戶端的 HTTP 狀態碼
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingUser | RelayError::InvalidPagination { .. } => {
                StatusCode::BAD_REQUEST
            }
            RelayError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            RelayError::UpstreamStatus { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::RequestBuildError { .. }
            | RelayError::BodyReadError { .. }
            | RelayError::IoError(_)
            | RelayError::ConfigError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::ConfigValidationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 回應本文：每種錯誤固定一句訊息
    pub fn public_message(&self) -> String {
        match self {
            RelayError::MissingUser => "user not specified".to_string(),
            RelayError::InvalidPagination { field, .. } => format!("invalid {}", field),
            RelayError::RequestBuildError { .. } => "failed to create request".to_string(),
            RelayError::UpstreamUnavailable { .. } => "failed to contact GitHub".to_string(),
            RelayError::UpstreamStatus { .. } => "GitHub API error".to_string(),
            RelayError::BodyReadError { .. } => "failed to read response".to_string(),
            _ => "internal server error".to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::MissingUser | RelayError::InvalidPagination { .. } => ErrorCategory::Client,
            RelayError::UpstreamUnavailable { .. }
            | RelayError::UpstreamStatus { .. }
            | RelayError::BodyReadError { .. } => ErrorCategory::Upstream,
            RelayError::ConfigError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            RelayError::RequestBuildError { .. } | RelayError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Client => ErrorSeverity::Low,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RelayError::MissingUser => "Request /{user} with a GitHub login",
            RelayError::InvalidPagination { .. } => {
                "Use a positive page and a per_page between 1 and 100"
            }
            RelayError::UpstreamUnavailable { .. } => {
                "Check network connectivity and upstream_base_url, or raise timeout_seconds"
            }
            RelayError::UpstreamStatus { status: 403 | 429 } => {
                "GitHub rate limit reached; send a GITHUB_TOKEN header or enable retries"
            }
            RelayError::UpstreamStatus { .. } => "Check the requested user and pagination values",
            RelayError::BodyReadError { .. } => "Retry the request; the upstream closed early",
            RelayError::RequestBuildError { .. } => "Check upstream_base_url and user_agent",
            RelayError::IoError(_) => "Check that the bind address is free and permitted",
            RelayError::ConfigError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::ConfigValidationError { .. } => {
                "Fix the configuration file or command-line flags and restart"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("設定錯誤: {}", self),
            ErrorCategory::System => format!("系統錯誤: {}", self),
            ErrorCategory::Upstream => format!("上游服務錯誤: {}", self),
            ErrorCategory::Client => format!("請求錯誤: {}", self),
        }
    }
}

impl From<UpstreamFailure> for RelayError {
    fn from(failure: UpstreamFailure) -> Self {
        match failure {
            UpstreamFailure::Build(message) => RelayError::RequestBuildError { message },
            UpstreamFailure::Transport(message) => RelayError::UpstreamUnavailable { message },
            UpstreamFailure::Status { status, .. } => RelayError::UpstreamStatus { status },
            UpstreamFailure::Body(message) => RelayError::BodyReadError { message },
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self.severity() {
            ErrorSeverity::Low => tracing::debug!("request rejected: {}", self),
            ErrorSeverity::Medium => tracing::warn!("upstream failure: {}", self),
            _ => tracing::error!("❌ relay failure: {} ({:?})", self, self.category()),
        }
        // 純文字並以換行結尾
        (
            status,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; charset=utf-8",
            )],
            format!("{}\n", self.public_message()),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
