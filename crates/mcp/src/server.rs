//! MCP server: newline-delimited JSON-RPC 2.0 over stdio.
//!
//! Every request is answered on the writer, one JSON object per line.
//! Notifications get no response. Tool failures are reported inside a
//! successful `tools/call` result with `isError` set.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

/// Longest accepted request line, in bytes
const MAX_LINE_LENGTH: usize = 4 * 1024 * 1024;

pub struct McpServer {
    registry: ToolRegistry,
    server_info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_info: ServerInfo {
                name: "kitbridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve stdin/stdout until stdin is closed
    pub async fn start(&self) -> Result<()> {
        info!(tools = self.registry.len(), "MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Answer requests read from `reader` until end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    // The codec discards the rest of the line
                    warn!(max = MAX_LINE_LENGTH, "Request line too long");
                    let response = JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error());
                    write_response(&mut writer, &response).await?;
                    continue;
                }
                Err(LinesCodecError::Io(e)) => {
                    return Err(e).context("Failed to read request line");
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                write_response(&mut writer, &response).await?;
            }
        }

        Ok(())
    }

    /// Parse and answer one raw line
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Unparseable request");
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(_) => Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request())),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "Handling request");

        if request.jsonrpc != "2.0" {
            let id = request.id.unwrap_or(Value::Null);
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        if request.is_notification() {
            match request.method.as_str() {
                "notifications/initialized" => info!("Client initialized"),
                other => debug!(method = other, "Ignoring notification"),
            }
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        let params = request.params.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, params),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.call_tool(id, params).await,
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };
        Some(response)
    }

    fn initialize(&self, id: Value, params: Value) -> JsonRpcResponse {
        match serde_json::from_value::<InitializeParams>(params) {
            Ok(params) => info!(
                client = %params.client_info.name,
                client_version = %params.client_info.version,
                protocol = %params.protocol_version,
                "Initializing session"
            ),
            Err(e) => debug!(error = %e, "Initialize without usable client info"),
        }

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability { list_changed: false }),
                },
                server_info: self.server_info.clone(),
            },
        )
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params = match serde_json::from_value::<CallToolParams>(params)
            .context("tools/call requires a tool name")
        {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params(format!("{:#}", e)))
            }
        };

        let Some(tool) = self.registry.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            );
        };

        let result = match tool.execute(params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool rejected its arguments");
                CallToolResult::error(format!("{:#}", e))
            }
        };

        if result.is_error() {
            debug!(tool = %params.name, "Tool call returned an error result");
        }
        JsonRpcResponse::success(id, result)
    }
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let mut json = serde_json::to_string(response).context("Failed to serialize response")?;
    json.push('\n');
    writer
        .write_all(json.as_bytes())
        .await
        .context("Failed to write response")?;
    writer.flush().await.context("Failed to flush response")?;
    Ok(())
}
