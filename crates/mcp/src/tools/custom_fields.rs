// Custom field tools

use super::common::{cached_read, normalize};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{json_schema_object, Tool};
use anyhow::Result;
use kitbridge_core::TtlStrategy;

pub struct ListCustomFieldsTool {
    state: AppState,
}

impl ListCustomFieldsTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for ListCustomFieldsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_custom_fields".to_string(),
            description: "List every custom subscriber field".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let client = &self.state.client;
        cached_read(&self.state, "list_custom_fields", &arguments, TtlStrategy::Long, || {
            client.list_custom_fields()
        })
        .await
    }
}
