//! Server configuration: an optional TOML file overlaid with CLI flags and
//! `KIT_*` environment variables.

use anyhow::{Context, Result};
use kitbridge_core::{CacheConfig, RateLimitConfig};
use kitbridge_sdk::{RetryConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitbridgeConfig {
    pub api: ApiSection,
    pub rate_limit: RateLimitSection,
    pub cache: CacheSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            access_token: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    pub requests_per_minute: u32,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            requests_per_minute: 120,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_size: usize,
    pub check_period_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            max_size: 1000,
            check_period_secs: 60,
        }
    }
}

/// Settings that can be given on the command line or through the
/// environment. They take precedence over the configuration file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Kit API key
    #[arg(long, env = "KIT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Kit OAuth access token
    #[arg(long, env = "KIT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Kit API base URL
    #[arg(long, env = "KIT_BASE_URL")]
    pub base_url: Option<String>,

    /// Requests admitted per rolling minute
    #[arg(long, env = "KIT_REQUESTS_PER_MINUTE")]
    pub requests_per_minute: Option<u32>,

    /// Enable or disable the response cache
    #[arg(long, env = "KIT_CACHE_ENABLED")]
    pub cache_enabled: Option<bool>,

    /// Default cache TTL in seconds
    #[arg(long, env = "KIT_CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,
}

impl KitbridgeConfig {
    /// Load the configuration file if it exists, otherwise use defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path).with_context(|| {
                format!("Failed to read configuration file {}", config_path.display())
            })?;
            Self::from_toml(&content).with_context(|| {
                format!("Failed to parse configuration file {}", config_path.display())
            })
        } else {
            tracing::info!(path = %config_path.display(), "Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply CLI/environment overrides on top of the file values.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.api_key {
            self.api.api_key = Some(api_key);
        }
        if let Some(access_token) = overrides.access_token {
            self.api.access_token = Some(access_token);
        }
        if let Some(base_url) = overrides.base_url {
            self.api.base_url = base_url;
        }
        if let Some(rpm) = overrides.requests_per_minute {
            self.rate_limit.requests_per_minute = rpm;
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = enabled;
        }
        if let Some(ttl) = overrides.cache_ttl_secs {
            self.cache.ttl_secs = ttl;
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_minute: self.rate_limit.requests_per_minute,
            retry_delay: Duration::from_millis(self.rate_limit.retry_delay_ms),
            max_retry_delay: Duration::from_millis(self.rate_limit.max_retry_delay_ms),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.cache.enabled,
            ttl: Duration::from_secs(self.cache.ttl_secs),
            max_size: self.cache.max_size,
            check_period: Duration::from_secs(self.cache.check_period_secs),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.api.max_retries,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
