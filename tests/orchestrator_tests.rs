//! End-to-end orchestration tests
//!
//! Wires the real client session to the real server through an in-memory
//! loopback transport, and scripts the model with a stub. No network, no
//! subprocesses.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use mcp_agent_rust::agent::Agent;
use mcp_agent_rust::error::{McpAgentError, ModelError, SessionError};
use mcp_agent_rust::llm::types::{
    AssistantMessage, ChatMessage, ChatTool, FunctionCall, ToolCall, ToolChoice,
};
use mcp_agent_rust::llm::ChatModel;
use mcp_agent_rust::mcp::registry::ToolRegistry;
use mcp_agent_rust::mcp::server::McpServer;
use mcp_agent_rust::mcp::session::Session;
use mcp_agent_rust::mcp::tools::arithmetic_tools;
use mcp_agent_rust::mcp::transport::{Transport, TransportError};
use mcp_agent_rust::mcp::types::{JsonRpcRequest, JsonRpcResponse};

/// Feeds every sent request straight into an in-process `McpServer` and
/// queues its responses for `recv`.
struct LoopbackTransport {
    server: Mutex<McpServer>,
    queue: Mutex<VecDeque<JsonRpcResponse>>,
}

impl LoopbackTransport {
    fn new(server: McpServer) -> Self {
        Self {
            server: Mutex::new(server),
            queue: Mutex::new(VecDeque::new()),
        }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, request: &JsonRpcRequest) -> Result<(), TransportError> {
        let line = serde_json::to_string(request)?;
        if let Some(response) = self.server.lock().await.handle_message(&line) {
            self.queue.lock().await.push_back(response);
        }
        Ok(())
    }

    async fn recv(&self) -> Result<JsonRpcResponse, TransportError> {
        self.queue.lock().await.pop_front().ok_or(TransportError::Closed)
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Scripted model: pops one canned assistant message per call and records
/// what it was shown.
struct StubModel {
    responses: Mutex<VecDeque<AssistantMessage>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, usize, ToolChoice)>>,
}

impl StubModel {
    fn new(responses: Vec<AssistantMessage>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn calls(&self) -> Vec<(Vec<ChatMessage>, usize, ToolChoice)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ChatModel for StubModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ChatTool],
        tool_choice: ToolChoice,
    ) -> Result<AssistantMessage, ModelError> {
        self.calls
            .lock()
            .await
            .push((messages.to_vec(), tools.len(), tool_choice));
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| ModelError::MalformedResponse("stub exhausted".to_string()))
    }
}

fn text_reply(text: &str) -> AssistantMessage {
    AssistantMessage {
        content: Some(text.to_string()),
        tool_calls: vec![],
    }
}

fn tool_call_reply(id: &str, name: &str, arguments: &str) -> AssistantMessage {
    AssistantMessage {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }],
    }
}

async fn ready_session() -> Session {
    let mut registry = ToolRegistry::new();
    arithmetic_tools(&mut registry);

    let transport = LoopbackTransport::new(McpServer::new(registry));
    let mut session = Session::new(Box::new(transport));
    session.initialize(Duration::from_secs(1)).await.unwrap();
    session
}

#[tokio::test]
async fn scenario_a_no_tool_needed() {
    let mut session = ready_session().await;
    let model = StubModel::new(vec![text_reply("Conceptually, it is four.")]);

    let answer = Agent::new(&mut session, &model)
        .answer("What is 2+2 conceptually?")
        .await
        .unwrap();

    assert_eq!(answer.as_deref(), Some("Conceptually, it is four."));

    // Exactly one model call, no tool round.
    let calls = model.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].2, ToolChoice::Auto);
    // The discovered tools were offered to the model.
    assert_eq!(calls[0].1, 2);
}

#[tokio::test]
async fn scenario_b_one_tool_call() {
    let mut session = ready_session().await;
    let model = StubModel::new(vec![
        tool_call_reply("call_1", "add", r#"{"a": 1, "b": 2}"#),
        text_reply("The sum is 3."),
    ]);

    let answer = Agent::new(&mut session, &model)
        .answer("What is 1 plus 2?")
        .await
        .unwrap();

    assert_eq!(answer.as_deref(), Some("The sum is 3."));

    let calls = model.calls().await;
    assert_eq!(calls.len(), 2);

    // Second round forbids further tool use.
    assert_eq!(calls[1].2, ToolChoice::None);

    // The follow-up conversation carries the executed result, tagged with
    // the request's correlation id.
    let follow_up = &calls[1].0;
    assert!(follow_up.contains(&ChatMessage::tool("call_1", "3")));

    // Conversation order: user, assistant (tool request), tool result.
    assert!(matches!(follow_up[0], ChatMessage::User { .. }));
    assert!(matches!(follow_up[1], ChatMessage::Assistant { .. }));
    assert!(matches!(follow_up[2], ChatMessage::Tool { .. }));
}

#[tokio::test]
async fn scenario_c_unknown_tool_folded_into_conversation() {
    let mut session = ready_session().await;
    let model = StubModel::new(vec![
        tool_call_reply("call_9", "subtract", r#"{"a": 5, "b": 2}"#),
        text_reply("That tool is not available."),
    ]);

    let answer = Agent::new(&mut session, &model)
        .answer("What is 5 minus 2?")
        .await
        .unwrap();

    // The turn completes despite the failed call.
    assert_eq!(answer.as_deref(), Some("That tool is not available."));

    let calls = model.calls().await;
    assert_eq!(calls.len(), 2);
    let folded = calls[1]
        .0
        .iter()
        .find_map(|m| match m {
            ChatMessage::Tool { tool_call_id, content } if tool_call_id == "call_9" => {
                Some(content.clone())
            }
            _ => None,
        })
        .expect("tool-role message for the failed call");
    assert!(folded.contains("Unknown tool"));
    assert!(folded.contains("subtract"));
}

#[tokio::test]
async fn invalid_arguments_folded_into_conversation() {
    let mut session = ready_session().await;
    let model = StubModel::new(vec![
        tool_call_reply("call_2", "add", r#"{"a": 1}"#),
        text_reply("I could not compute that."),
    ]);

    let answer = Agent::new(&mut session, &model)
        .answer("Add one to nothing")
        .await
        .unwrap();
    assert_eq!(answer.as_deref(), Some("I could not compute that."));

    let calls = model.calls().await;
    let folded = &calls[1].0[2];
    match folded {
        ChatMessage::Tool { content, .. } => {
            assert!(content.contains("Invalid tool arguments"))
        }
        other => panic!("expected tool message, got {:?}", other),
    }
}

#[tokio::test]
async fn undecodable_model_arguments_folded_into_conversation() {
    let mut session = ready_session().await;
    let model = StubModel::new(vec![
        tool_call_reply("call_3", "add", "{not json"),
        text_reply("Something went wrong."),
    ]);

    let answer = Agent::new(&mut session, &model)
        .answer("Add things")
        .await
        .unwrap();
    assert_eq!(answer.as_deref(), Some("Something went wrong."));
}

#[tokio::test]
async fn answer_returns_none_without_text_content() {
    let mut session = ready_session().await;
    let model = StubModel::new(vec![AssistantMessage {
        content: None,
        tool_calls: vec![],
    }]);

    let answer = Agent::new(&mut session, &model).answer("Say nothing").await.unwrap();
    assert!(answer.is_none());
}

#[tokio::test]
async fn answer_fails_when_session_not_ready() {
    let mut registry = ToolRegistry::new();
    arithmetic_tools(&mut registry);
    let transport = LoopbackTransport::new(McpServer::new(registry));
    let mut session = Session::new(Box::new(transport));

    let model = StubModel::new(vec![]);
    let err = Agent::new(&mut session, &model).answer("hello").await.unwrap_err();
    assert!(matches!(
        err,
        McpAgentError::Session(SessionError::NotReady { .. })
    ));
}

#[tokio::test]
async fn model_failure_surfaces_to_caller() {
    let mut session = ready_session().await;
    // Stub with no scripted responses: the first model call fails.
    let model = StubModel::new(vec![]);

    let err = Agent::new(&mut session, &model).answer("hello").await.unwrap_err();
    assert!(matches!(err, McpAgentError::Model(_)));
}

#[tokio::test]
async fn add_round_trip_through_session() {
    let mut session = ready_session().await;

    let result = session
        .call_tool("add", json!({"a": 1, "b": 2}), Duration::from_secs(5))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.first_text(), Some("3"));
}

#[tokio::test]
async fn list_tools_idempotent_through_session() {
    let mut session = ready_session().await;

    let first = session.list_tools().await.unwrap();
    let second = session.list_tools().await.unwrap();
    assert_eq!(first, second);

    let mut names: Vec<_> = first.iter().map(|t| t.name.clone()).collect();
    let count = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), count, "tool names must be unique");
}

#[tokio::test]
async fn call_tool_unknown_name_fails_typed() {
    let mut session = ready_session().await;

    let err = session
        .call_tool("multiply", json!({}), Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownTool { name } if name == "multiply"));
}
