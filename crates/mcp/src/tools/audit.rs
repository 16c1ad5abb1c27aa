// Account audit tool

use super::common::{json_result, parse_args};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::state::AppState;
use crate::tools::{json_schema_boolean, json_schema_object, Tool};
use anyhow::Result;
use kitbridge_core::{AuditError, AuditParams};
use tracing::warn;

/// Tool that runs the aggregated account audit
pub struct AccountAuditTool {
    state: AppState,
}

impl AccountAuditTool {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for AccountAuditTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "account_audit".to_string(),
            description: "Audit list health, segmentation, automation, lead capture and custom fields, with recommendations".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "include_performance": json_schema_boolean("Include open and click rates (always fetches fresh data)"),
                    "detailed_segments": json_schema_boolean("List every analysed tag instead of the ten largest"),
                    "date_range": {
                        "type": "object",
                        "description": "Reporting window for growth figures",
                        "properties": {
                            "start": { "type": "string", "format": "date" },
                            "end": { "type": "string", "format": "date" }
                        },
                        "required": ["start", "end"]
                    }
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let params: AuditParams = parse_args("account_audit", arguments)?;
        if let Some(range) = &params.date_range {
            if range.start > range.end {
                return Ok(CallToolResult::error("date_range start must not be after end"));
            }
        }

        match self.state.audit.execute(&params).await {
            Ok(report) => json_result(&report),
            Err(error @ AuditError::Setup(_)) => {
                warn!(error = %error, "Account audit aborted");
                Ok(CallToolResult::error(error.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }
}
