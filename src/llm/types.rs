//! Chat-completions types
//!
//! Conversation messages, tool schemas, and the request/response bodies
//! for an OpenAI-compatible chat API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

/// One message in the conversation, tagged by role.
///
/// The conversation is append-only: messages are built once and never
/// mutated after being pushed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum ChatMessage {
    /// User query
    #[serde(rename = "user")]
    User { content: String },

    /// Assistant reply, possibly carrying tool-call requests
    #[serde(rename = "assistant")]
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },

    /// Tool result, answering the call with `tool_call_id`
    #[serde(rename = "tool")]
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    /// Build a user message
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    /// Build a tool-role message answering `tool_call_id`
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// A tool-call request emitted by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Opaque correlation token pairing this request with its result
    pub id: String,

    /// Always "function"
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,

    /// The requested invocation
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Function name plus JSON-encoded arguments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// Tool name
    pub name: String,

    /// Arguments as a JSON-encoded string, per the chat API
    pub arguments: String,
}

impl FunctionCall {
    /// Decode the arguments string into a JSON value
    pub fn parse_arguments(&self) -> Result<Value, ModelError> {
        serde_json::from_str(&self.arguments).map_err(|e| {
            ModelError::MalformedResponse(format!(
                "tool call arguments for '{}' are not valid JSON: {}",
                self.name, e
            ))
        })
    }
}

/// A model-facing tool schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTool {
    /// Always "function"
    #[serde(rename = "type")]
    pub kind: String,

    /// Name/description/parameters triple
    pub function: FunctionDef,
}

/// Function declaration inside a tool schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDef {
    /// Tool name
    pub name: String,

    /// Tool description (empty string if the server reported none)
    pub description: String,

    /// Parameter schema, the discovered input schema verbatim
    pub parameters: Value,
}

impl ChatTool {
    /// Build a function tool schema
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Per-call directive controlling tool use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model may request tool invocations
    Auto,

    /// No tool calls permitted
    None,
}

/// Chat completions request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ChatTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// The assistant message inside a chat completions response
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AssistantMessage {
    /// Text content, absent when the model only requests tools
    pub content: Option<String>,

    /// Tool-call requests, in emission order
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantMessage {
    /// Convert into a conversation message for the follow-up call
    pub fn into_chat_message(self) -> ChatMessage {
        ChatMessage::Assistant {
            content: self.content,
            tool_calls: if self.tool_calls.is_empty() {
                None
            } else {
                Some(self.tool_calls)
            },
        }
    }
}

/// Chat completions response body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
}
