use crate::domain::ports::ConfigProvider;
use crate::utils::error::{RelayError, Result};
use std::net::SocketAddr;
use url::Url;

/// GitHub 的 per_page 上限
pub const MAX_PER_PAGE: u32 = 100;

/// 快取 ttl 上限：一週
pub const MAX_CACHE_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RelayError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_socket_addr(field_name: &str, addr: &str) -> Result<()> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: addr.to_string(),
            reason: format!("Invalid socket address: {}", e),
        })
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 兩種設定來源共用的檢查
pub fn validate_relay_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_socket_addr("bind", config.bind_address())?;
    validate_url("upstream_base_url", config.upstream_base_url())?;
    validate_non_empty_string("user_agent", config.user_agent())?;

    validate_positive_number(
        "timeout_seconds",
        usize::try_from(config.request_timeout().as_secs()).unwrap_or(usize::MAX),
        1,
    )?;

    validate_range("default_page", config.default_page(), 1, u32::MAX)?;
    validate_range("default_per_page", config.default_per_page(), 1, MAX_PER_PAGE)?;
    validate_range(
        "cache_ttl_seconds",
        config.cache_ttl().as_secs(),
        0,
        MAX_CACHE_TTL_SECONDS,
    )?;
    validate_range("max_concurrent_upstream", config.max_concurrent_upstream(), 1, 100)?;
    validate_range("retry_attempts", config.retry_attempts(), 0, 10)?;

    if config.retry_delay() > config.max_retry_delay() {
        return Err(RelayError::ConfigValidationError {
            field: "retry_delay_seconds".to_string(),
            message: "retry delay cannot exceed max_retry_delay_seconds".to_string(),
        });
    }

    tracing::debug!("✅ Relay configuration validation passed");
    Ok(())
}
