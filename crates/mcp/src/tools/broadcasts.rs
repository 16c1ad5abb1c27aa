// Broadcast tools

use super::common::{cached_read, check_page, normalize, parse_args};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{json_schema_integer, json_schema_object, pagination_properties, Tool};
use anyhow::Result;
use kitbridge_core::{PageRequest, TtlStrategy};
use serde::Deserialize;

/// Tool to list broadcasts
pub struct ListBroadcastsTool {
    state: AppState,
}

impl ListBroadcastsTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for ListBroadcastsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_broadcasts".to_string(),
            description: "List broadcasts, drafts and scheduled sends included".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(pagination_properties()), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let page: PageRequest = parse_args("list_broadcasts", arguments.clone())?;
        check_page(&page)?;

        let client = &self.state.client;
        cached_read(&self.state, "list_broadcasts", &arguments, TtlStrategy::Medium, || {
            client.list_broadcasts(&page)
        })
        .await
    }
}

/// Tool to get a single broadcast
pub struct GetBroadcastTool {
    state: AppState,
}

impl GetBroadcastTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct GetBroadcastArgs {
    broadcast_id: u64,
}

#[async_trait::async_trait]
impl Tool for GetBroadcastTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_broadcast".to_string(),
            description: "Get a broadcast by ID".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "broadcast_id": json_schema_integer("The broadcast ID")
                }),
                vec!["broadcast_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let args: GetBroadcastArgs = parse_args("get_broadcast", arguments.clone())?;

        let client = &self.state.client;
        cached_read(&self.state, "get_broadcast", &arguments, TtlStrategy::Medium, || {
            client.get_broadcast(args.broadcast_id)
        })
        .await
    }
}
