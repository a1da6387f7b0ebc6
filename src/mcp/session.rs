//! Client-side MCP session
//!
//! Owns one transport handle and drives the handshake, tool discovery,
//! and tool invocation with request/response correlation.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::mcp::transport::Transport;
use crate::mcp::types::*;

/// Client info reported during the handshake
const CLIENT_NAME: &str = "mcp-agent";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Initializing,
    Ready,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unconnected => "Unconnected",
            SessionState::Initializing => "Initializing",
            SessionState::Ready => "Ready",
            SessionState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// A stateful client handle over one transport.
///
/// Not reusable after a failed handshake or a lost transport; open a new
/// session instead.
pub struct Session {
    transport: Box<dyn Transport>,
    state: SessionState,
    next_id: i64,

    /// Responses that arrived while awaiting a different id
    stashed: HashMap<RequestId, JsonRpcResponse>,

    /// Ids whose requests timed out; late responses are discarded
    abandoned: HashSet<RequestId>,
}

impl Session {
    /// Create an unconnected session over a transport
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            state: SessionState::Unconnected,
            next_id: 1,
            stashed: HashMap::new(),
            abandoned: HashSet::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Perform the initialize handshake.
    ///
    /// On success the session is `Ready`. On timeout or a malformed
    /// acknowledgment it fails with `HandshakeFailed` and must be
    /// discarded, not retried in place.
    pub async fn initialize(&mut self, timeout: Duration) -> Result<InitializeResult, SessionError> {
        if self.state != SessionState::Unconnected {
            return Err(SessionError::HandshakeFailed {
                message: format!("handshake attempted in state {}", self.state),
            });
        }
        self.state = SessionState::Initializing;

        let params = InitializeParams {
            protocol_version: MCP_VERSION.to_string(),
            client_info: Implementation {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
            capabilities: serde_json::json!({ "tools": {} }),
        };
        let params = serde_json::to_value(params).map_err(|e| SessionError::HandshakeFailed {
            message: e.to_string(),
        })?;

        let id = self.fresh_id();
        let request = JsonRpcRequest::new(id.clone(), methods::INITIALIZE, Some(params));

        // The deadline covers the send as well: over HTTP the whole
        // round-trip happens inside `send`.
        let response = match tokio::time::timeout(timeout, self.send_and_await(request, &id)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.state = SessionState::Closed;
                return Err(SessionError::HandshakeFailed {
                    message: e.to_string(),
                });
            }
            Err(_) => {
                self.state = SessionState::Closed;
                return Err(SessionError::HandshakeFailed {
                    message: format!("no acknowledgment within {}s", timeout.as_secs()),
                });
            }
        };

        if let Some(error) = response.error {
            self.state = SessionState::Closed;
            return Err(SessionError::HandshakeFailed {
                message: error.message,
            });
        }

        let result: InitializeResult = response
            .result
            .ok_or_else(|| SessionError::HandshakeFailed {
                message: "acknowledgment carried no result".to_string(),
            })
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| SessionError::HandshakeFailed {
                    message: format!("malformed acknowledgment: {}", e),
                })
            })
            .map_err(|e| {
                self.state = SessionState::Closed;
                e
            })?;

        // Acknowledge back; the server expects this before serving tools.
        self.transport
            .send(&JsonRpcRequest::notification(methods::INITIALIZED, None))
            .await
            .map_err(|e| {
                self.state = SessionState::Closed;
                SessionError::HandshakeFailed {
                    message: e.to_string(),
                }
            })?;

        self.state = SessionState::Ready;
        debug!(server = %result.server_info.name, "session ready");
        Ok(result)
    }

    /// Fetch the currently published tool descriptors.
    ///
    /// A fresh snapshot each call; the server's registry is the source of
    /// truth.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, SessionError> {
        self.require_ready()?;

        let id = self.fresh_id();
        let request = JsonRpcRequest::new(id.clone(), methods::LIST_TOOLS, None);
        let response = self.send_and_await(request, &id).await?;

        if let Some(error) = response.error {
            return Err(SessionError::Protocol {
                message: error.message,
            });
        }

        let result: ListToolsResult = response
            .result
            .ok_or_else(|| SessionError::Protocol {
                message: "tools/list carried no result".to_string(),
            })
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| SessionError::Protocol {
                    message: e.to_string(),
                })
            })?;

        Ok(result.tools)
    }

    /// Invoke a tool and await its result up to `timeout`.
    ///
    /// A result with `isError = true` is returned normally — error content
    /// is data, callers must inspect the flag. On expiry the request is
    /// abandoned: the server may still finish, but its late response is
    /// discarded by this session.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
        timeout: Duration,
    ) -> Result<CallToolResult, SessionError> {
        self.require_ready()?;

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
            timeout_hint_secs: Some(timeout.as_secs()),
        };
        let params = serde_json::to_value(params).map_err(|e| SessionError::Protocol {
            message: e.to_string(),
        })?;

        let id = self.fresh_id();
        let request = JsonRpcRequest::new(id.clone(), methods::CALL_TOOL, Some(params));

        // The send runs inside the timed future too, so a transport whose
        // send blocks on the server (HTTP) still honors the deadline.
        let response = match tokio::time::timeout(timeout, self.send_and_await(request, &id)).await
        {
            Ok(result) => result?,
            Err(_) => {
                self.abandoned.insert(id);
                return Err(SessionError::Timeout {
                    name: name.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        if let Some(error) = response.error {
            return Err(match error.code {
                error_codes::UNKNOWN_TOOL => SessionError::UnknownTool {
                    name: name.to_string(),
                },
                error_codes::INVALID_PARAMS => SessionError::InvalidArguments {
                    message: error.message,
                },
                _ => SessionError::Protocol {
                    message: error.message,
                },
            });
        }

        response
            .result
            .ok_or_else(|| SessionError::Protocol {
                message: "tools/call carried no result".to_string(),
            })
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| SessionError::Protocol {
                    message: e.to_string(),
                })
            })
    }

    /// Release the transport. Valid from any state, idempotent.
    pub async fn close(&mut self) {
        self.state = SessionState::Closed;
        if let Err(e) = self.transport.close().await {
            warn!(error = %e, "transport close failed");
        }
    }

    fn require_ready(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            Err(SessionError::NotReady {
                state: self.state.to_string(),
            })
        }
    }

    fn fresh_id(&mut self) -> RequestId {
        let id = RequestId::Number(self.next_id);
        self.next_id += 1;
        id
    }

    /// Send `request` and await the response carrying `id`. Callers that
    /// enforce a deadline wrap this whole future in a timeout; the id is
    /// allocated up front so an expired call can still be abandoned.
    async fn send_and_await(
        &mut self,
        request: JsonRpcRequest,
        id: &RequestId,
    ) -> Result<JsonRpcResponse, SessionError> {
        self.transport.send(&request).await.map_err(|e| {
            self.state = SessionState::Closed;
            SessionError::TransportLost {
                message: e.to_string(),
            }
        })?;

        self.await_response(id).await
    }

    /// Await the response carrying `id`. Responses for other pending ids
    /// are stashed; responses for abandoned ids are dropped. Matching is
    /// by correlation id, never arrival order.
    async fn await_response(&mut self, id: &RequestId) -> Result<JsonRpcResponse, SessionError> {
        if let Some(response) = self.stashed.remove(id) {
            return Ok(response);
        }

        loop {
            let response = self.transport.recv().await.map_err(|e| {
                self.state = SessionState::Closed;
                SessionError::TransportLost {
                    message: e.to_string(),
                }
            })?;

            // A null response id means the server could not attribute one
            // of our frames; nothing to correlate, fail the wait.
            let Some(response_id) = response.id.clone() else {
                let message = response
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "response with null id".to_string());
                return Err(SessionError::Protocol { message });
            };

            if &response_id == id {
                return Ok(response);
            }
            if self.abandoned.remove(&response_id) {
                debug!(id = ?response_id, "discarding response for abandoned request");
                continue;
            }
            self.stashed.insert(response_id, response);
        }
    }
}
