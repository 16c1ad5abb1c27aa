pub mod account;
pub mod audit;
pub mod broadcasts;
mod common;
pub mod custom_fields;
pub mod forms;
pub mod ops;
mod registry;
pub mod sequences;
pub mod subscribers;
pub mod tags;

pub use account::{GetAccountTool, GetEmailStatsTool, GetGrowthStatsTool};
pub use audit::AccountAuditTool;
pub use broadcasts::{GetBroadcastTool, ListBroadcastsTool};
pub use custom_fields::ListCustomFieldsTool;
pub use forms::{ListFormSubscribersTool, ListFormsTool};
pub use ops::{CacheClearTool, CacheStatsTool, RateLimitStatusTool};
pub use registry::{
    json_schema_boolean, json_schema_enum, json_schema_integer, json_schema_object,
    json_schema_string, pagination_properties, Tool, ToolAccess, ToolRegistry,
};
pub use sequences::{ListSequenceSubscribersTool, ListSequencesTool};
pub use subscribers::{CreateSubscriberTool, GetSubscriberTool, ListSubscribersTool};
pub use tags::{CreateTagTool, ListTagSubscribersTool, ListTagsTool, TagSubscriberTool};

use crate::state::AppState;
use std::sync::Arc;

/// Register every Kit tool, sharing `state` between them.
pub fn register_all(registry: &mut ToolRegistry, state: &AppState) {
    registry.register(Arc::new(GetAccountTool::new(state.clone())));
    registry.register(Arc::new(GetEmailStatsTool::new(state.clone())));
    registry.register(Arc::new(GetGrowthStatsTool::new(state.clone())));

    registry.register(Arc::new(ListSubscribersTool::new(state.clone())));
    registry.register(Arc::new(GetSubscriberTool::new(state.clone())));
    registry.register(Arc::new(CreateSubscriberTool::new(state.clone())));

    registry.register(Arc::new(ListTagsTool::new(state.clone())));
    registry.register(Arc::new(CreateTagTool::new(state.clone())));
    registry.register(Arc::new(TagSubscriberTool::new(state.clone())));
    registry.register(Arc::new(ListTagSubscribersTool::new(state.clone())));

    registry.register(Arc::new(ListSequencesTool::new(state.clone())));
    registry.register(Arc::new(ListSequenceSubscribersTool::new(state.clone())));

    registry.register(Arc::new(ListFormsTool::new(state.clone())));
    registry.register(Arc::new(ListFormSubscribersTool::new(state.clone())));

    registry.register(Arc::new(ListBroadcastsTool::new(state.clone())));
    registry.register(Arc::new(GetBroadcastTool::new(state.clone())));

    registry.register(Arc::new(ListCustomFieldsTool::new(state.clone())));

    registry.register(Arc::new(AccountAuditTool::new(state.clone())));

    registry.register(Arc::new(CacheStatsTool::new(state.clone())));
    registry.register(Arc::new(CacheClearTool::new(state.clone())));
    registry.register(Arc::new(RateLimitStatusTool::new(state.clone())));
}

impl ToolRegistry {
    /// Registry holding every Kit tool
    pub fn with_kit_tools(state: &AppState) -> Self {
        let mut registry = Self::new();
        register_all(&mut registry, state);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CallToolResult;
    use kitbridge_core::testing::{subscriber, tag, MockMarketingApi};
    use kitbridge_core::{
        CacheConfig, RateLimitConfig, RateLimiter, ResponseCache, SubscriberState,
    };
    use serde_json::json;

    fn state_with(api: MockMarketingApi) -> (AppState, Arc<MockMarketingApi>) {
        let api = Arc::new(api);
        let state = AppState::from_parts(
            api.clone(),
            Arc::new(ResponseCache::new(CacheConfig::default())),
            Arc::new(RateLimiter::new(RateLimitConfig::default())),
        );
        (state, api)
    }

    fn text(result: &CallToolResult) -> &str {
        result.content[0].as_text()
    }

    async fn call(registry: &ToolRegistry, name: &str, args: serde_json::Value) -> CallToolResult {
        registry.get(name).unwrap().execute(args).await.unwrap()
    }

    #[test]
    fn test_registers_every_tool() {
        let (state, _) = state_with(MockMarketingApi::new());
        let registry = ToolRegistry::with_kit_tools(&state);

        assert_eq!(registry.len(), 21);
        assert_eq!(
            registry.names_with_access(ToolAccess::Write),
            vec!["create_subscriber", "create_tag", "tag_subscriber"]
        );
        for schema in registry.list_schemas() {
            assert_eq!(schema.input_schema["type"], "object", "{}", schema.name);
        }
    }

    #[tokio::test]
    async fn test_read_is_served_from_cache() {
        let (state, api) = state_with(MockMarketingApi::new());
        let registry = ToolRegistry::with_kit_tools(&state);

        let first = call(&registry, "get_account", serde_json::Value::Null).await;
        let second = call(&registry, "get_account", json!({})).await;

        assert!(!first.is_error());
        assert!(text(&first).contains("Example Creator"));
        assert_eq!(first, second);
        assert_eq!(api.calls("get_account"), 1);
        assert_eq!(state.cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_different_arguments_use_different_keys() {
        let api = MockMarketingApi::new().with_tags(vec![tag(1, "Buyers", None)]);
        let (state, api) = state_with(api);
        let registry = ToolRegistry::with_kit_tools(&state);

        call(&registry, "list_tags", json!({})).await;
        call(&registry, "list_tags", json!({"per_page": 10})).await;
        call(&registry, "list_tags", json!({"per_page": 10})).await;

        assert_eq!(api.calls("list_tags"), 2);
    }

    #[tokio::test]
    async fn test_write_invalidates_related_reads() {
        let api = MockMarketingApi::new()
            .with_tags(vec![tag(1, "Buyers", None)])
            .with_subscribers(vec![subscriber(7, SubscriberState::Active)], Some(1));
        let (state, api) = state_with(api);
        let registry = ToolRegistry::with_kit_tools(&state);

        call(&registry, "list_tags", json!({})).await;
        call(&registry, "list_subscribers", json!({})).await;
        call(&registry, "get_account", json!({})).await;
        assert_eq!(state.cache.stats().key_count, 3);

        let created = call(&registry, "create_tag", json!({"name": "Leads"})).await;
        assert!(!created.is_error());
        assert_eq!(state.cache.keys(), vec!["get_account", "list_subscribers"]);

        call(&registry, "get_subscriber", json!({"subscriber_id": 7})).await;
        call(&registry, "tag_subscriber", json!({"tag_id": 1, "email_address": "subscriber7@example.com"}))
            .await;
        assert_eq!(state.cache.keys(), vec!["get_account"]);

        call(&registry, "list_tags", json!({})).await;
        assert_eq!(api.calls("list_tags"), 2);
    }

    #[tokio::test]
    async fn test_upsert_drops_cached_subscriber() {
        let api = MockMarketingApi::new()
            .with_subscribers(vec![subscriber(7, SubscriberState::Active)], Some(1));
        let (state, api) = state_with(api);
        let registry = ToolRegistry::with_kit_tools(&state);

        call(&registry, "get_subscriber", json!({"subscriber_id": 7})).await;
        assert!(state.cache.has("get_subscriber:subscriber_id:7"));

        let upserted = call(
            &registry,
            "create_subscriber",
            json!({"email_address": "subscriber7@example.com", "first_name": "New"}),
        )
        .await;
        assert!(!upserted.is_error());
        assert!(state.cache.keys().is_empty());

        call(&registry, "get_subscriber", json!({"subscriber_id": 7})).await;
        assert_eq!(api.calls("get_subscriber"), 2);
    }

    #[tokio::test]
    async fn test_api_failure_is_a_tool_error_and_not_cached() {
        let (state, api) = state_with(MockMarketingApi::new().failing("list_forms"));
        let registry = ToolRegistry::with_kit_tools(&state);

        let result = call(&registry, "list_forms", json!({})).await;
        assert!(result.is_error());
        assert!(text(&result).starts_with("Error: "));

        call(&registry, "list_forms", json!({})).await;
        assert_eq!(api.calls("list_forms"), 2);
        assert_eq!(state.cache.stats().key_count, 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let (state, api) = state_with(MockMarketingApi::new());
        let registry = ToolRegistry::with_kit_tools(&state);

        let missing = registry.get("get_subscriber").unwrap().execute(json!({})).await;
        assert!(missing.unwrap_err().to_string().contains("get_subscriber"));

        let oversized = registry
            .get("list_tags")
            .unwrap()
            .execute(json!({"per_page": 5000}))
            .await;
        assert!(oversized.is_err());

        let blank = call(&registry, "create_tag", json!({"name": "  "})).await;
        assert!(blank.is_error());

        let range = call(&registry, "get_growth_stats", json!({"starting": "2024-06-01"})).await;
        assert!(range.is_error());

        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_account_audit_tool() {
        let api = MockMarketingApi::new()
            .with_subscribers(vec![subscriber(1, SubscriberState::Active)], Some(1));
        let (state, _) = state_with(api);
        let registry = ToolRegistry::with_kit_tools(&state);

        let result = call(&registry, "account_audit", json!({})).await;
        assert!(!result.is_error());

        let report: serde_json::Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(report["account_summary"]["account_name"], "Example Creator");
        assert!(report["strategic_recommendations"].as_array().unwrap().len() >= 2);

        let reversed = call(
            &registry,
            "account_audit",
            json!({"date_range": {"start": "2024-06-30", "end": "2024-06-01"}}),
        )
        .await;
        assert!(reversed.is_error());
    }

    #[tokio::test]
    async fn test_account_audit_setup_failure() {
        let api = MockMarketingApi::new()
            .with_config_error(kitbridge_core::ApiError::Config("no credentials".to_string()));
        let (state, _) = state_with(api);
        let registry = ToolRegistry::with_kit_tools(&state);

        let result = call(&registry, "account_audit", json!({})).await;
        assert!(result.is_error());
        assert!(text(&result).contains("no credentials"));
    }

    #[tokio::test]
    async fn test_ops_tools() {
        let (state, _) = state_with(MockMarketingApi::new());
        let registry = ToolRegistry::with_kit_tools(&state);

        call(&registry, "get_account", json!({})).await;
        call(&registry, "get_account", json!({})).await;

        let stats: serde_json::Value =
            serde_json::from_str(text(&call(&registry, "cache_stats", json!({})).await)).unwrap();
        assert_eq!(stats["hits"], 1);
        assert_eq!(stats["key_count"], 1);

        state
            .cache
            .set("stale", json!(1), Some(std::time::Duration::ZERO));
        let cleared = call(&registry, "cache_clear", json!({})).await;
        // The already-expired entry is not reported as removed
        assert!(text(&cleared).contains("(1 entries removed)"));
        assert_eq!(state.cache.stats().key_count, 0);

        let status: serde_json::Value =
            serde_json::from_str(text(&call(&registry, "rate_limit_status", json!({})).await))
                .unwrap();
        assert_eq!(status["requests_per_minute"], 120);
        assert_eq!(status["requests_in_last_minute"], 0);
    }
}
