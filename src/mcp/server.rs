//! MCP server implementation
//!
//! Serves a tool registry over newline-delimited JSON-RPC on stdio.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};
use crate::mcp::registry::ToolRegistry;
use crate::mcp::types::*;

/// MCP server info
const SERVER_NAME: &str = "mcp-agent";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server wrapping a tool registry
pub struct McpServer {
    registry: ToolRegistry,

    /// Set once the client sends `notifications/initialized`; tool
    /// methods are rejected until then
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            initialized: false,
        }
    }

    /// Run the server on stdio until the input pipe closes.
    ///
    /// Responses go to stdout; logs must go to stderr, stdout is the
    /// protocol channel.
    pub async fn run_stdio(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line) {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        debug!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one incoming JSON-RPC message. Returns `None` for
    /// notifications and unparseable notifications.
    pub fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                // A malformed frame has no determinable id; echo null.
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        debug!(method = %request.method, "handling request");

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        // Tool methods are only served once the client has acknowledged
        // the handshake with `notifications/initialized`.
        let needs_init =
            matches!(request.method.as_str(), methods::LIST_TOOLS | methods::CALL_TOOL);
        if needs_init && !self.initialized {
            return Some(JsonRpcResponse::error(
                Some(id),
                JsonRpcError::invalid_request("server not initialized"),
            ));
        }

        Some(match request.method.as_str() {
            methods::INITIALIZE => {
                JsonRpcResponse::success(id, self.handle_initialize())
            }
            methods::PING => JsonRpcResponse::success(id, serde_json::json!({})),
            methods::LIST_TOOLS => {
                let result = ListToolsResult {
                    tools: self.registry.list(),
                };
                match serde_json::to_value(result) {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(e) => JsonRpcResponse::error(
                        Some(id),
                        JsonRpcError::invalid_params(e.to_string()),
                    ),
                }
            }
            methods::CALL_TOOL => self.handle_call_tool(id, request.params.as_ref()),
            other => JsonRpcResponse::error(Some(id), JsonRpcError::method_not_found(other)),
        })
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            methods::INITIALIZED => {
                self.initialized = true;
                debug!("client initialized");
            }
            other => warn!(method = %other, "ignoring unknown notification"),
        }
    }

    fn handle_initialize(&self) -> serde_json::Value {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
        };

        // InitializeResult serialization cannot fail: all fields are plain
        // strings and unit structs.
        serde_json::to_value(result).unwrap_or(serde_json::Value::Null)
    }

    /// Dispatch `tools/call`. Unknown names and schema violations become
    /// JSON-RPC errors; handler failures become `isError` results.
    fn handle_call_tool(
        &self,
        id: RequestId,
        params: Option<&serde_json::Value>,
    ) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p.clone()) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        Some(id),
                        JsonRpcError::invalid_params(format!("invalid tool params: {}", e)),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    Some(id),
                    JsonRpcError::invalid_params("missing tool params"),
                );
            }
        };

        match self.registry.invoke(&params.name, &params.arguments) {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => {
                    JsonRpcResponse::error(Some(id), JsonRpcError::invalid_params(e.to_string()))
                }
            },
            Err(RegistryError::UnknownTool { name }) => {
                JsonRpcResponse::error(Some(id), JsonRpcError::unknown_tool(name))
            }
            Err(RegistryError::InvalidArguments { message }) => {
                JsonRpcResponse::error(Some(id), JsonRpcError::invalid_params(message))
            }
        }
    }
}
