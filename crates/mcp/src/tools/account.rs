// Account tools: account details and statistics

use super::common::{cached_read, normalize, parse_args};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{json_schema_object, json_schema_string, Tool};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use kitbridge_core::{DateRange, TtlStrategy};
use serde::Deserialize;

/// Tool to get the authenticated account
pub struct GetAccountTool {
    state: AppState,
}

impl GetAccountTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for GetAccountTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_account".to_string(),
            description: "Get the Kit account and user the credentials belong to".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let client = &self.state.client;
        cached_read(&self.state, "get_account", &arguments, TtlStrategy::Long, || {
            client.get_account()
        })
        .await
    }
}

/// Tool to get email delivery statistics
pub struct GetEmailStatsTool {
    state: AppState,
}

impl GetEmailStatsTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for GetEmailStatsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_email_stats".to_string(),
            description: "Get sent, opened and clicked totals for the last 90 days".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let client = &self.state.client;
        cached_read(&self.state, "get_email_stats", &arguments, TtlStrategy::Medium, || {
            client.get_email_stats()
        })
        .await
    }
}

/// Tool to get subscriber growth
pub struct GetGrowthStatsTool {
    state: AppState,
}

impl GetGrowthStatsTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[derive(Debug, Deserialize)]
struct GrowthStatsArgs {
    #[serde(default)]
    starting: Option<NaiveDate>,
    #[serde(default)]
    ending: Option<NaiveDate>,
}

impl GrowthStatsArgs {
    fn range(&self) -> Result<Option<DateRange>> {
        match (self.starting, self.ending) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) if start <= end => Ok(Some(DateRange { start, end })),
            (Some(_), Some(_)) => bail!("starting must not be after ending"),
            _ => bail!("starting and ending must be given together"),
        }
    }
}

#[async_trait::async_trait]
impl Tool for GetGrowthStatsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_growth_stats".to_string(),
            description: "Get new subscribers, cancellations and net growth for a period (default: last 90 days)".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "starting": json_schema_string("Start date, YYYY-MM-DD"),
                    "ending": json_schema_string("End date, YYYY-MM-DD")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let arguments = normalize(arguments);
        let args: GrowthStatsArgs = parse_args("get_growth_stats", arguments.clone())?;
        let range = match args.range() {
            Ok(range) => range,
            Err(e) => return Ok(CallToolResult::error(e.to_string())),
        };

        let client = &self.state.client;
        cached_read(&self.state, "get_growth_stats", &arguments, TtlStrategy::Medium, || {
            client.get_growth_stats(range)
        })
        .await
    }
}
