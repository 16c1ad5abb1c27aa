// Sequence tools

use super::common::{cached_read, check_page, normalize, parse_args};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{json_schema_integer, json_schema_object, pagination_properties, Tool};
use anyhow::Result;
use kitbridge_core::{PageRequest, TtlStrategy};
use serde::Deserialize;

/// Tool to list sequences
pub struct ListSequencesTool {
    state: AppState,
}

impl ListSequencesTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for ListSequencesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_sequences".to_string(),
            description: "List email sequences with their hold and repeat settings".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(pagination_properties()), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let page: PageRequest = parse_args("list_sequences", arguments.clone())?;
        check_page(&page)?;

        let client = &self.state.client;
        cached_read(&self.state, "list_sequences", &arguments, TtlStrategy::Medium, || {
            client.list_sequences(&page)
        })
        .await
    }
}

/// Tool to list subscribers enrolled in a sequence
pub struct ListSequenceSubscribersTool {
    state: AppState,
}

impl ListSequenceSubscribersTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct ListSequenceSubscribersArgs {
    sequence_id: u64,
    #[serde(flatten)]
    page: PageRequest,
}

#[async_trait::async_trait]
impl Tool for ListSequenceSubscribersTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = pagination_properties();
        properties.insert("sequence_id".to_string(), json_schema_integer("The sequence ID"));

        ToolSchema {
            name: "list_sequence_subscribers".to_string(),
            description: "List subscribers enrolled in a sequence".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(properties), vec!["sequence_id"]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let args: ListSequenceSubscribersArgs =
            parse_args("list_sequence_subscribers", arguments.clone())?;
        check_page(&args.page)?;

        let client = &self.state.client;
        cached_read(
            &self.state,
            "list_sequence_subscribers",
            &arguments,
            TtlStrategy::Short,
            || client.list_sequence_subscribers(args.sequence_id, &args.page),
        )
        .await
    }
}
