use super::DEFAULT_BIND_ADDRESS;
use crate::adapters::github::{DEFAULT_UPSTREAM_BASE_URL, DEFAULT_USER_AGENT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{validate_relay_config, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerConfig>,
    pub upstream: Option<UpstreamConfig>,
    pub pagination: Option<PaginationConfig>,
    pub cache: Option<CacheConfig>,
    pub retry: Option<RetryConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub max_concurrent_requests: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page: Option<u32>,
    pub default_per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: Option<u64>,
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    pub delay_seconds: Option<u64>,
    pub max_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RelayError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RelayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GITHUB_API_URL})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RelayError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 是否輸出詳細日誌
    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    /// 是否以 JSON 格式輸出日誌
    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn bind_address(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    fn upstream_base_url(&self) -> &str {
        self.upstream
            .as_ref()
            .and_then(|u| u.base_url.as_deref())
            .unwrap_or(DEFAULT_UPSTREAM_BASE_URL)
    }

    fn user_agent(&self) -> &str {
        self.upstream
            .as_ref()
            .and_then(|u| u.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upstream
                .as_ref()
                .and_then(|u| u.timeout_seconds)
                .unwrap_or(10),
        )
    }

    fn default_page(&self) -> u32 {
        self.pagination
            .as_ref()
            .and_then(|p| p.default_page)
            .unwrap_or(1)
    }

    fn default_per_page(&self) -> u32 {
        self.pagination
            .as_ref()
            .and_then(|p| p.default_per_page)
            .unwrap_or(5)
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.as_ref().and_then(|c| c.ttl_seconds).unwrap_or(60))
    }

    fn cache_capacity(&self) -> usize {
        self.cache.as_ref().and_then(|c| c.capacity).unwrap_or(1024)
    }

    fn max_concurrent_upstream(&self) -> usize {
        self.upstream
            .as_ref()
            .and_then(|u| u.max_concurrent_requests)
            .unwrap_or(5)
    }

    fn retry_attempts(&self) -> u32 {
        self.retry.as_ref().and_then(|r| r.attempts).unwrap_or(0)
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(
            self.retry
                .as_ref()
                .and_then(|r| r.delay_seconds)
                .unwrap_or(1),
        )
    }

    fn max_retry_delay(&self) -> Duration {
        Duration::from_secs(
            self.retry
                .as_ref()
                .and_then(|r| r.max_delay_seconds)
                .unwrap_or(30),
        )
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_relay_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
bind = "0.0.0.0:9090"

[upstream]
base_url = "https://ghe.example.com/api/v3"
timeout_seconds = 3
user_agent = "relay-test"
max_concurrent_requests = 2

[pagination]
default_page = 2
default_per_page = 30

[cache]
ttl_seconds = 0
capacity = 16

[retry]
attempts = 3
delay_seconds = 2
max_delay_seconds = 10

[logging]
verbose = true
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:9090");
        assert_eq!(config.upstream_base_url(), "https://ghe.example.com/api/v3");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.user_agent(), "relay-test");
        assert_eq!(config.max_concurrent_upstream(), 2);
        assert_eq!(config.default_page(), 2);
        assert_eq!(config.default_per_page(), 30);
        assert_eq!(config.cache_ttl(), Duration::ZERO);
        assert_eq!(config.cache_capacity(), 16);
        assert_eq!(config.retry_attempts(), 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.max_retry_delay(), Duration::from_secs(10));
        assert!(config.verbose());
        assert!(config.log_json());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.bind_address(), DEFAULT_BIND_ADDRESS);
        assert_eq!(config.upstream_base_url(), DEFAULT_UPSTREAM_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.default_page(), 1);
        assert_eq!(config.default_per_page(), 5);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.retry_attempts(), 0);
        assert!(!config.verbose());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GIST_RELAY_TEST_UPSTREAM", "http://127.0.0.1:4010");

        let toml_content = r#"
[upstream]
base_url = "${GIST_RELAY_TEST_UPSTREAM}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.upstream_base_url(), "http://127.0.0.1:4010");

        std::env::remove_var("GIST_RELAY_TEST_UPSTREAM");
    }

    #[test]
    fn test_undefined_env_var_is_left_in_place() {
        let toml_content = r#"
[upstream]
base_url = "${GIST_RELAY_SURELY_UNDEFINED}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.upstream_base_url(), "${GIST_RELAY_SURELY_UNDEFINED}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[upstream]
base_url = "invalid-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[server\nbind = ").unwrap_err();
        assert!(matches!(err, RelayError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[server]
bind = "127.0.0.1:7070"

[cache]
ttl_seconds = 5
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:7070");
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TomlConfig::from_file("/nonexistent/gist-relay.toml").unwrap_err();
        assert!(matches!(err, RelayError::IoError(_)));
    }
}
