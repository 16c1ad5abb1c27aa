// Form tools

use super::common::{cached_read, check_page, normalize, parse_args};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{json_schema_integer, json_schema_object, pagination_properties, Tool};
use anyhow::Result;
use kitbridge_core::{PageRequest, TtlStrategy};
use serde::Deserialize;

pub struct ListFormsTool {
    state: AppState,
}

impl ListFormsTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for ListFormsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_forms".to_string(),
            description: "List forms and landing pages".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(pagination_properties()), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let page: PageRequest = parse_args("list_forms", arguments.clone())?;
        check_page(&page)?;

        let client = &self.state.client;
        cached_read(&self.state, "list_forms", &arguments, TtlStrategy::Medium, || {
            client.list_forms(&page)
        })
        .await
    }
}

pub struct ListFormSubscribersTool {
    state: AppState,
}

impl ListFormSubscribersTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct ListFormSubscribersArgs {
    form_id: u64,
    #[serde(flatten)]
    page: PageRequest,
}

#[async_trait::async_trait]
impl Tool for ListFormSubscribersTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = pagination_properties();
        properties.insert("form_id".to_string(), json_schema_integer("The form ID"));

        ToolSchema {
            name: "list_form_subscribers".to_string(),
            description: "List subscribers who signed up through a form".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(properties), vec!["form_id"]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let args: ListFormSubscribersArgs = parse_args("list_form_subscribers", arguments.clone())?;
        check_page(&args.page)?;

        let client = &self.state.client;
        cached_read(&self.state, "list_form_subscribers", &arguments, TtlStrategy::Short, || {
            client.list_form_subscribers(args.form_id, &args.page)
        })
        .await
    }
}
