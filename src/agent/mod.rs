//! Model/tool orchestration loop
//!
//! Drives the two-round conversation: one model call that may request
//! tools, sequential tool execution through the session, then a final
//! model call with tool use disabled.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{McpAgentError, Result};
use crate::llm::types::{ChatMessage, ChatTool, ToolChoice};
use crate::llm::ChatModel;
use crate::mcp::session::Session;
use crate::mcp::types::ToolDescriptor;

/// Default per tool-call deadline
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Translate discovered tool descriptors into model-facing tool schemas.
///
/// Pure and uncached: called once per turn right before the model call, so
/// schema drift between turns is reflected automatically. A missing
/// description becomes the empty string; the input schema passes through
/// verbatim.
pub fn adapt_tools(descriptors: &[ToolDescriptor]) -> Vec<ChatTool> {
    descriptors
        .iter()
        .map(|tool| {
            ChatTool::function(
                tool.name.clone(),
                tool.description.clone().unwrap_or_default(),
                tool.input_schema.clone(),
            )
        })
        .collect()
}

/// The orchestration loop over one session and one model client.
pub struct Agent<'a, M: ChatModel> {
    session: &'a mut Session,
    model: &'a M,
    tool_timeout: Duration,
}

impl<'a, M: ChatModel> Agent<'a, M> {
    /// Create an agent over a ready session
    pub fn new(session: &'a mut Session, model: &'a M) -> Self {
        Self {
            session,
            model,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Override the per tool-call deadline
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Answer a query, using at most one round of tool calls.
    ///
    /// Invocation failures (unknown tool, invalid arguments, timeout) are
    /// folded into tool-role messages so the model can see and react to
    /// them; session and model failures surface to the caller. Returns
    /// `None` when the model produced no text content.
    pub async fn answer(&mut self, query: &str) -> Result<Option<String>> {
        let descriptors = self.session.list_tools().await.map_err(McpAgentError::Session)?;
        let tools = adapt_tools(&descriptors);
        debug!(tool_count = tools.len(), "starting turn");

        let mut conversation = vec![ChatMessage::user(query)];

        let assistant = self
            .model
            .complete(&conversation, &tools, ToolChoice::Auto)
            .await
            .map_err(McpAgentError::Model)?;

        let content = assistant.content.clone();
        let tool_calls = assistant.tool_calls.clone();
        conversation.push(assistant.into_chat_message());

        // Terminal in one round when the model asked for no tools.
        if tool_calls.is_empty() {
            return Ok(content);
        }

        // Execute sequentially, in the order the model emitted them. Every
        // request gets exactly one tool-role answer before the follow-up
        // model call.
        for call in tool_calls {
            let name = call.function.name.clone();
            info!(tool = %name, id = %call.id, "executing tool call");

            let outcome = match call.function.parse_arguments() {
                Ok(arguments) => self.session.call_tool(&name, arguments, self.tool_timeout).await,
                Err(e) => {
                    warn!(tool = %name, error = %e, "model emitted undecodable arguments");
                    conversation.push(ChatMessage::tool(call.id, format!("Error: {}", e)));
                    continue;
                }
            };

            let text = match outcome {
                Ok(result) => result.first_text().unwrap_or_default().to_string(),
                Err(e) if e.is_invocation_error() => {
                    warn!(tool = %name, error = %e, "tool call failed, folding into conversation");
                    format!("Error: {}", e)
                }
                Err(e) => return Err(McpAgentError::Session(e)),
            };
            conversation.push(ChatMessage::tool(call.id, text));
        }

        // Follow-up call with tool use disabled: tool depth is capped at
        // one round-trip.
        let final_message = self
            .model
            .complete(&conversation, &tools, ToolChoice::None)
            .await
            .map_err(McpAgentError::Model)?;

        Ok(final_message.content)
    }
}
