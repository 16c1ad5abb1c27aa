// Subscriber tools

use super::common::{cached_read, check_page, finish_write, normalize, parse_args};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{
    json_schema_enum, json_schema_integer, json_schema_object, json_schema_string,
    pagination_properties, Tool, ToolAccess,
};
use anyhow::Result;
use kitbridge_core::{NewSubscriber, SubscriberQuery, SubscriberState, TtlStrategy};
use serde::Deserialize;

const STATES: [&str; 5] = ["active", "bounced", "cancelled", "complained", "inactive"];

/// Tool to list subscribers
pub struct ListSubscribersTool {
    state: AppState,
}

impl ListSubscribersTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for ListSubscribersTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = pagination_properties();
        properties.insert(
            "status".to_string(),
            json_schema_enum(&STATES, "Only subscribers in this state (default: active)"),
        );
        properties.insert(
            "email_address".to_string(),
            json_schema_string("Only the subscriber with this email address"),
        );

        ToolSchema {
            name: "list_subscribers".to_string(),
            description: "List subscribers, optionally filtered by state or email address".to_string(),
            input_schema: json_schema_object(serde_json::Value::Object(properties), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let query: SubscriberQuery = parse_args("list_subscribers", arguments.clone())?;
        check_page(&query.page)?;

        let client = &self.state.client;
        cached_read(&self.state, "list_subscribers", &arguments, TtlStrategy::Short, || {
            client.list_subscribers(&query)
        })
        .await
    }
}

/// Tool to get a single subscriber
pub struct GetSubscriberTool {
    state: AppState,
}

impl GetSubscriberTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct GetSubscriberArgs {
    subscriber_id: u64,
}

#[async_trait::async_trait]
impl Tool for GetSubscriberTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_subscriber".to_string(),
            description: "Get a subscriber by ID".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "subscriber_id": json_schema_integer("The subscriber ID")
                }),
                vec!["subscriber_id"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let args: GetSubscriberArgs = parse_args("get_subscriber", arguments.clone())?;

        let client = &self.state.client;
        cached_read(&self.state, "get_subscriber", &arguments, TtlStrategy::Short, || {
            client.get_subscriber(args.subscriber_id)
        })
        .await
    }
}

/// Tool to create (or update) a subscriber
pub struct CreateSubscriberTool {
    state: AppState,
}

impl CreateSubscriberTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct CreateSubscriberArgs {
    email_address: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    state: Option<SubscriberState>,
}

#[async_trait::async_trait]
impl Tool for CreateSubscriberTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_subscriber".to_string(),
            description: "Create a subscriber, or update the first name of an existing one with the same email address".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "email_address": json_schema_string("Subscriber email address"),
                    "first_name": json_schema_string("Subscriber first name"),
                    "state": json_schema_enum(&STATES, "Initial state (default: active)")
                }),
                vec!["email_address"],
            ),
        }
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: CreateSubscriberArgs = parse_args("create_subscriber", arguments)?;
        if args.email_address.trim().is_empty() {
            return Ok(CallToolResult::error("email_address must not be empty"));
        }

        let subscriber = NewSubscriber {
            email_address: args.email_address.trim().to_string(),
            first_name: args.first_name,
            state: args.state,
        };
        let outcome = self.state.client.create_subscriber(&subscriber).await;
        finish_write(&self.state, outcome, &["subscribers", "get_subscriber"])
    }
}
