//! MCP Agent - Rust Implementation
//!
//! One binary, two roles: `serve` runs the tool server on stdio;
//! `ask` connects to a server, runs the orchestration loop, and prints
//! the model's answer.

use clap::{Parser, Subcommand};

use mcp_agent_rust::agent::Agent;
use mcp_agent_rust::config::Config;
use mcp_agent_rust::error::{McpAgentError, Result, SessionError};
use mcp_agent_rust::llm::OpenAiClient;
use mcp_agent_rust::mcp::registry::ToolRegistry;
use mcp_agent_rust::mcp::server::McpServer;
use mcp_agent_rust::mcp::session::Session;
use mcp_agent_rust::mcp::tools::arithmetic_tools;
use mcp_agent_rust::mcp::transport;

/// MCP Agent
#[derive(Parser)]
#[command(name = "mcp-agent")]
#[command(author, version, about = "MCP tool server and model orchestration agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP tool server on stdio
    Serve,

    /// Ask the model a question, letting it call the server's tools
    Ask {
        /// The query to answer
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries protocol frames in serve mode and
    // the final answer in ask mode.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => run_server().await,
        Commands::Ask { query } => run_query(config, &query).await,
    }
}

async fn run_server() -> Result<()> {
    let mut registry = ToolRegistry::new();
    arithmetic_tools(&mut registry);

    let mut server = McpServer::new(registry);
    server.run_stdio().await
}

async fn run_query(config: Config, query: &str) -> Result<()> {
    let model = OpenAiClient::from_config(&config)?;

    let transport = transport::connect(&config.transport).await.map_err(|e| {
        McpAgentError::Session(SessionError::TransportLost {
            message: e.to_string(),
        })
    })?;
    let mut session = Session::new(transport);

    // The transport is released on every exit path, including errors.
    let outcome = drive(&mut session, &config, &model, query).await;
    session.close().await;

    match outcome? {
        Some(answer) => println!("{}", answer),
        None => eprintln!("(the model produced no text content)"),
    }

    Ok(())
}

async fn drive(
    session: &mut Session,
    config: &Config,
    model: &OpenAiClient,
    query: &str,
) -> Result<Option<String>> {
    let init = session
        .initialize(config.handshake_timeout)
        .await
        .map_err(McpAgentError::Session)?;
    tracing::info!(
        server = %init.server_info.name,
        version = %init.server_info.version,
        "connected to tool server"
    );

    let tools = session.list_tools().await.map_err(McpAgentError::Session)?;
    for tool in &tools {
        tracing::info!(
            name = %tool.name,
            description = tool.description.as_deref().unwrap_or(""),
            "discovered tool"
        );
    }

    Agent::new(session, model)
        .with_tool_timeout(config.tool_timeout)
        .answer(query)
        .await
}
