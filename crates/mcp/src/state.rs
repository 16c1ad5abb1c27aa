//! Shared context handed to every tool.

use crate::config::KitbridgeConfig;
use anyhow::{Context, Result};
use kitbridge_core::{AccountAudit, MarketingApi, RateLimiter, ResponseCache};
use kitbridge_sdk::KitClient;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Process-wide services, constructed once at startup
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn MarketingApi>,
    pub cache: Arc<ResponseCache>,
    pub limiter: Arc<RateLimiter>,
    pub audit: Arc<AccountAudit>,
}

impl AppState {
    /// Build the Kit client, limiter and cache from configuration.
    pub fn new(config: &KitbridgeConfig) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_config()));

        let mut builder = KitClient::builder()
            .base_url(config.api.base_url.clone())
            .timeout(config.timeout())
            .retry_config(config.retry_config())
            .rate_limiter(limiter.clone());
        if let Some(api_key) = &config.api.api_key {
            builder = builder.api_key(api_key.clone());
        }
        if let Some(token) = &config.api.access_token {
            builder = builder.access_token(token.clone());
        }
        let client = builder.build().context("Failed to create Kit client")?;

        let cache = Arc::new(ResponseCache::new(config.cache_config()));

        Ok(Self::from_parts(Arc::new(client), cache, limiter))
    }

    pub fn from_parts(
        client: Arc<dyn MarketingApi>,
        cache: Arc<ResponseCache>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let audit = Arc::new(AccountAudit::new(client.clone(), cache.clone()));
        Self {
            client,
            cache,
            limiter,
            audit,
        }
    }

    /// Start the periodic cache sweep. Abort the handle on shutdown.
    pub fn start_sweeper(&self) -> Option<JoinHandle<()>> {
        self.cache.spawn_sweeper()
    }
}
