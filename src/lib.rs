//! MCP Agent - Rust Implementation
//!
//! A Model Context Protocol (MCP) tool server, client session, and
//! model/tool orchestration loop. Serves callable tools over JSON-RPC and
//! lets a chat model discover and invoke them to answer a query.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;

pub use config::Config;
pub use error::{McpAgentError, Result};
