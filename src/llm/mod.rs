//! Model service client: conversation types and the OpenAI-compatible
//! chat-completions implementation.

pub mod openai;
pub mod types;

pub use openai::{ChatModel, OpenAiClient};
