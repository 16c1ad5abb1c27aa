// Tag tools

use super::common::{cached_read, check_page, finish_write, normalize, parse_args};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{
    json_schema_integer, json_schema_object, json_schema_string, pagination_properties, Tool,
    ToolAccess,
};
use anyhow::Result;
use kitbridge_core::{PageRequest, TtlStrategy};
use serde::Deserialize;

/// Tool to list tags
pub struct ListTagsTool {
    state: AppState,
}

impl ListTagsTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for ListTagsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_tags".to_string(),
            description: "List tags in the account".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(pagination_properties()), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let page: PageRequest = parse_args("list_tags", arguments.clone())?;
        check_page(&page)?;

        let client = &self.state.client;
        cached_read(&self.state, "list_tags", &arguments, TtlStrategy::Medium, || {
            client.list_tags(&page)
        })
        .await
    }
}

/// Tool to create a tag
pub struct CreateTagTool {
    state: AppState,
}

impl CreateTagTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct CreateTagArgs {
    name: String,
}

#[async_trait::async_trait]
impl Tool for CreateTagTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_tag".to_string(),
            description: "Create a tag".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "name": json_schema_string("Tag name")
                }),
                vec!["name"],
            ),
        }
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: CreateTagArgs = parse_args("create_tag", arguments)?;
        let name = args.name.trim();
        if name.is_empty() {
            return Ok(CallToolResult::error("name must not be empty"));
        }

        let outcome = self.state.client.create_tag(name).await;
        finish_write(&self.state, outcome, &["tags"])
    }
}

/// Tool to tag a subscriber by email address
pub struct TagSubscriberTool {
    state: AppState,
}

impl TagSubscriberTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct TagSubscriberArgs {
    tag_id: u64,
    email_address: String,
}

#[async_trait::async_trait]
impl Tool for TagSubscriberTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "tag_subscriber".to_string(),
            description: "Apply a tag to the subscriber with the given email address".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "tag_id": json_schema_integer("The tag ID"),
                    "email_address": json_schema_string("Subscriber email address")
                }),
                vec!["tag_id", "email_address"],
            ),
        }
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: TagSubscriberArgs = parse_args("tag_subscriber", arguments)?;

        let outcome = self
            .state
            .client
            .tag_subscriber(args.tag_id, args.email_address.trim())
            .await;
        finish_write(&self.state, outcome, &["tags", "subscribers", "get_subscriber"])
    }
}

/// Tool to list subscribers carrying a tag
pub struct ListTagSubscribersTool {
    state: AppState,
}

impl ListTagSubscribersTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct ListTagSubscribersArgs {
    tag_id: u64,
    #[serde(flatten)]
    page: PageRequest,
}

#[async_trait::async_trait]
impl Tool for ListTagSubscribersTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = pagination_properties();
        properties.insert("tag_id".to_string(), json_schema_integer("The tag ID"));

        ToolSchema {
            name: "list_tag_subscribers".to_string(),
            description: "List subscribers that carry a tag".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(properties), vec!["tag_id"]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let args: ListTagSubscribersArgs = parse_args("list_tag_subscribers", arguments.clone())?;
        check_page(&args.page)?;

        let client = &self.state.client;
        cached_read(&self.state, "list_tag_subscribers", &arguments, TtlStrategy::Short, || {
            client.list_tag_subscribers(args.tag_id, &args.page)
        })
        .await
    }
}
