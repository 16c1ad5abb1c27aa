// Shared plumbing for the Kit tools

use crate::protocol::CallToolResult;
use crate::state::AppState;
use anyhow::{Context, Result};
use kitbridge_core::{ApiError, ApiResult, PageRequest, ResponseCache, TtlStrategy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// Largest page the Kit API accepts
pub(crate) const MAX_PER_PAGE: u32 = 1000;

/// Absent arguments are treated as an empty object
pub(crate) fn normalize(arguments: Value) -> Value {
    match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(normalize(arguments))
        .with_context(|| format!("Invalid arguments for {}", tool))
}

pub(crate) fn check_page(page: &PageRequest) -> Result<()> {
    if let Some(per_page) = page.per_page {
        anyhow::ensure!(
            (1..=MAX_PER_PAGE).contains(&per_page),
            "per_page must be between 1 and {}",
            MAX_PER_PAGE
        );
    }
    Ok(())
}

/// Pretty-printed JSON as text content
pub(crate) fn json_result(value: &impl Serialize) -> Result<CallToolResult> {
    let json = serde_json::to_string_pretty(value)?;
    Ok(CallToolResult::text(json))
}

pub(crate) fn api_error(error: &ApiError) -> CallToolResult {
    CallToolResult::error(error.to_string())
}

/// Serve a read through the response cache, keyed by tool name and
/// arguments. Failed reads are reported as tool errors and never cached.
pub(crate) async fn cached_read<T, F, Fut>(
    state: &AppState,
    tool: &str,
    arguments: &Value,
    strategy: TtlStrategy,
    read: F,
) -> Result<CallToolResult>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let key = ResponseCache::generate_key(tool, arguments);
    let outcome = state
        .cache
        .get_or_compute(&key, Some(strategy.ttl()), || async move {
            let value = read().await?;
            serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
        })
        .await;

    match outcome {
        Ok(value) => json_result(&value),
        Err(error) => Ok(api_error(&error)),
    }
}

/// Report a write and drop cache entries whose keys contain any of
/// `patterns`.
pub(crate) fn finish_write<T: Serialize>(
    state: &AppState,
    outcome: ApiResult<T>,
    patterns: &[&str],
) -> Result<CallToolResult> {
    match outcome {
        Ok(value) => {
            let removed: usize = patterns
                .iter()
                .map(|pattern| state.cache.invalidate_pattern(pattern))
                .sum();
            debug!(removed, ?patterns, "Invalidated cache after write");
            json_result(&value)
        }
        Err(error) => Ok(api_error(&error)),
    }
}
