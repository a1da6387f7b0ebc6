//! Error types for the MCP agent
//!
//! This module defines the error hierarchy for the protocol layer,
//! the client session, the model client, and configuration loading.

use thiserror::Error;

/// Main error type for the MCP agent
#[derive(Error, Debug)]
pub enum McpAgentError {
    /// Client session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Model service errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the client-side session.
///
/// `UnknownTool`, `InvalidArguments` and `Timeout` are invocation errors:
/// the orchestrator folds them into conversation data instead of aborting
/// the turn. The rest are fatal to the session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Handshake failed: {message}")]
    HandshakeFailed { message: String },

    #[error("Session is not ready (state: {state})")]
    NotReady { state: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Tool call timed out after {timeout_secs}s: {name}")]
    Timeout { name: String, timeout_secs: u64 },

    #[error("Transport lost: {message}")]
    TransportLost { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

impl SessionError {
    /// Whether the orchestrator may fold this error into the conversation
    /// rather than failing the whole turn.
    pub fn is_invocation_error(&self) -> bool {
        matches!(
            self,
            SessionError::UnknownTool { .. }
                | SessionError::InvalidArguments { .. }
                | SessionError::Timeout { .. }
        )
    }
}

/// Errors from the server-side tool registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

/// Errors from the model service client.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model network error: {0}")]
    Network(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Result type alias for MCP agent operations
pub type Result<T> = std::result::Result<T, McpAgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::UnknownTool {
            name: "multiply".to_string(),
        };
        assert!(err.to_string().contains("multiply"));
    }

    #[test]
    fn test_error_conversion() {
        let session_err = SessionError::NotReady {
            state: "Closed".to_string(),
        };
        let err: McpAgentError = session_err.into();
        assert!(matches!(err, McpAgentError::Session(_)));
    }

    #[test]
    fn test_invocation_error_classification() {
        assert!(SessionError::UnknownTool { name: "x".into() }.is_invocation_error());
        assert!(SessionError::InvalidArguments { message: "m".into() }.is_invocation_error());
        assert!(SessionError::Timeout { name: "x".into(), timeout_secs: 5 }.is_invocation_error());
        assert!(!SessionError::TransportLost { message: "m".into() }.is_invocation_error());
        assert!(!SessionError::HandshakeFailed { message: "m".into() }.is_invocation_error());
    }
}
