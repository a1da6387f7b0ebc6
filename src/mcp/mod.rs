//! MCP protocol implementation: wire types, server, client session,
//! transports, and the tool registry.

pub mod registry;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;
