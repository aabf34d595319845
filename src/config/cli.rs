use super::DEFAULT_BIND_ADDRESS;
use crate::adapters::github::{DEFAULT_UPSTREAM_BASE_URL, DEFAULT_USER_AGENT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_relay_config, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "gist-relay")]
#[command(about = "Relays GitHub public gist listings over HTTP")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: String,

    #[arg(long, default_value = DEFAULT_UPSTREAM_BASE_URL)]
    pub upstream_base_url: String,

    #[arg(long, default_value = "10")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "1")]
    pub default_page: u32,

    #[arg(long, default_value = "5")]
    pub default_per_page: u32,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(long, default_value = "60", help = "Cache lifetime; 0 disables caching")]
    pub cache_ttl_seconds: u64,

    #[arg(long, default_value = "1024")]
    pub cache_capacity: usize,

    #[arg(long, default_value = "5")]
    pub max_concurrent_upstream: usize,

    #[arg(long, default_value = "0")]
    pub retry_attempts: u32,

    #[arg(long, default_value = "1")]
    pub retry_delay_seconds: u64,

    #[arg(long, default_value = "30")]
    pub max_retry_delay_seconds: u64,

    #[arg(long, help = "TOML configuration file; overrides the flags above")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDRESS.to_string(),
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            timeout_seconds: 10,
            default_page: 1,
            default_per_page: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_ttl_seconds: 60,
            cache_capacity: 1024,
            max_concurrent_upstream: 5,
            retry_attempts: 0,
            retry_delay_seconds: 1,
            max_retry_delay_seconds: 30,
            config: None,
            verbose: false,
            log_json: false,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn bind_address(&self) -> &str {
        &self.bind
    }

    fn upstream_base_url(&self) -> &str {
        &self.upstream_base_url
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn default_page(&self) -> u32 {
        self.default_page
    }

    fn default_per_page(&self) -> u32 {
        self.default_per_page
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    fn max_concurrent_upstream(&self) -> usize {
        self.max_concurrent_upstream
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    fn max_retry_delay(&self) -> Duration {
        Duration::from_secs(self.max_retry_delay_seconds)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_relay_config(self)
    }
}
