//! Language model invocation.
//!
//! The agent talks to the model only through [`ModelInvoker`], so the OpenAI
//! client can be swapped for a scripted invoker in tests.

mod openai;
mod scripted;

pub use openai::OpenAIInvoker;
pub use scripted::ScriptedInvoker;

use crate::conversation::{Conversation, ToolCallRequest};
use crate::error::Result;
use crate::tools::ToolDeclaration;
use async_trait::async_trait;

/// What the model decided to do this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// The model answered the user.
    FinalAnswer(String),
    /// The model wants one or more tools run first.
    ToolCallsRequested(Vec<ToolCallRequest>),
}

impl ModelResponse {
    /// Build a response from raw completion parts. An empty tool-call list is a final answer.
    pub fn from_parts(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        if tool_calls.is_empty() {
            ModelResponse::FinalAnswer(content.unwrap_or_default())
        } else {
            ModelResponse::ToolCallsRequested(tool_calls)
        }
    }
}

/// Trait for model inference.
///
/// Implementations are stateless between calls: every call receives the whole
/// conversation so far.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        conversation: &Conversation,
        declarations: &[ToolDeclaration],
    ) -> Result<ModelResponse>;
}
