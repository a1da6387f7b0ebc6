//! Configuration management for the MCP agent
//!
//! Handles environment variables, transport selection, and defaults.

use std::time::Duration;

use crate::error::{ConfigError, McpAgentError, Result};

/// Default model for the chat client
const DEFAULT_MODEL: &str = "gpt-4o";

/// Default base URL for the OpenAI-compatible API
const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default per-call tool invocation timeout (seconds)
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 5;

/// Default initialize handshake timeout (seconds)
const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// How the client reaches the tool server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Spawn a subprocess and speak JSON-RPC over its stdin/stdout
    Stdio { command: String, args: Vec<String> },

    /// POST JSON-RPC envelopes to an HTTP endpoint
    Http { url: String },
}

/// Configuration for the MCP agent
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat model identifier
    pub model: String,

    /// API key for the model service (required only for `ask`)
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    pub api_base_url: String,

    /// Transport used to reach the tool server
    pub transport: TransportConfig,

    /// Per tool-call timeout
    pub tool_timeout: Duration,

    /// Initialize handshake timeout
    pub handshake_timeout: Duration,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `MCP_AGENT_MODEL`, `OPENAI_API_KEY`,
    /// `OPENAI_BASE_URL`, `MCP_SERVER_URL` (selects the HTTP transport),
    /// `MCP_SERVER_COMMAND` / `MCP_SERVER_ARGS` (stdio transport),
    /// `MCP_TOOL_TIMEOUT_SECS`, `MCP_HANDSHAKE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let model = std::env::var("MCP_AGENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let api_key = std::env::var("OPENAI_API_KEY").ok();

        let api_base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        // An explicit server URL selects the HTTP transport; otherwise the
        // agent spawns its own binary in `serve` mode over stdio.
        let transport = match std::env::var("MCP_SERVER_URL") {
            Ok(url) => TransportConfig::Http { url },
            Err(_) => {
                let command = std::env::var("MCP_SERVER_COMMAND")
                    .unwrap_or_else(|_| default_server_command());
                let args = match std::env::var("MCP_SERVER_ARGS") {
                    Ok(raw) => raw.split_whitespace().map(str::to_string).collect(),
                    Err(_) => vec!["serve".to_string()],
                };
                TransportConfig::Stdio { command, args }
            }
        };

        let tool_timeout =
            Duration::from_secs(env_secs("MCP_TOOL_TIMEOUT_SECS", DEFAULT_TOOL_TIMEOUT_SECS)?);
        let handshake_timeout = Duration::from_secs(env_secs(
            "MCP_HANDSHAKE_TIMEOUT_SECS",
            DEFAULT_HANDSHAKE_TIMEOUT_SECS,
        )?);

        Ok(Self {
            model,
            api_key,
            api_base_url,
            transport,
            tool_timeout,
            handshake_timeout,
        })
    }

    /// The API key, or a configuration error naming the missing variable.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            McpAgentError::Config(ConfigError::MissingEnvVar {
                var: "OPENAI_API_KEY".to_string(),
            })
        })
    }
}

/// Parse a positive-seconds environment variable with a default.
fn env_secs(var: &str, default: u64) -> Result<u64> {
    match std::env::var(var) {
        Ok(raw) => raw.parse::<u64>().map_err(|_| {
            McpAgentError::Config(ConfigError::InvalidConfig {
                message: format!("{} must be an integer number of seconds, got '{}'", var, raw),
            })
        }),
        Err(_) => Ok(default),
    }
}

/// Fall back to the running binary so `ask` can self-host the server.
fn default_server_command() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| "mcp-agent".to_string())
}
