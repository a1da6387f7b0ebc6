//! OpenAI-compatible chat client
//!
//! Implements the `ChatModel` trait against any chat-completions API.

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{ModelError, Result};
use crate::llm::types::{AssistantMessage, ChatMessage, ChatRequest, ChatResponse, ChatTool, ToolChoice};

/// The model service seam: one conversation in, one assistant message out.
///
/// The inference call may suspend for as long as the remote service takes;
/// failures propagate, no retries at this layer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ChatTool],
        tool_choice: ToolChoice,
    ) -> std::result::Result<AssistantMessage, ModelError>;
}

/// Chat client for OpenAI-compatible APIs
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client from configuration; fails when no API key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: config.require_api_key()?.to_string(),
            model: config.model.clone(),
            base_url: config.api_base_url.clone(),
        })
    }

    /// Create a client with explicit parameters
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ChatTool],
        tool_choice: ToolChoice,
    ) -> std::result::Result<AssistantMessage, ModelError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            // Sending tool_choice without tools is rejected by the API.
            tool_choice: if tools.is_empty() { None } else { Some(tool_choice) },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, message });
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ModelError::MalformedResponse("response carried no choices".to_string()))
    }
}
