// Local diagnostics: response cache and rate limiter

use super::common::json_result;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{json_schema_object, Tool};
use anyhow::Result;
use tracing::info;

pub struct CacheStatsTool {
    state: AppState,
}

impl CacheStatsTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for CacheStatsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "cache_stats".to_string(),
            description: "Show response cache size, hits, misses and hit rate".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        json_result(&self.state.cache.stats())
    }
}

pub struct CacheClearTool {
    state: AppState,
}

impl CacheClearTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for CacheClearTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "cache_clear".to_string(),
            description: "Drop every cached response".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        let expired = self.state.cache.purge_expired();
        let cleared = self.state.cache.stats().key_count;
        self.state.cache.clear();
        info!(cleared, expired, "Response cache cleared");

        Ok(CallToolResult::text(format!(
            "Cache cleared ({} entries removed)",
            cleared
        )))
    }
}

pub struct RateLimitStatusTool {
    state: AppState,
}

impl RateLimitStatusTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for RateLimitStatusTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "rate_limit_status".to_string(),
            description: "Show requests made in the last minute and the remaining budget".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
        json_result(&self.state.limiter.status())
    }
}
