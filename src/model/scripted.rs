//! Scripted model invoker.
//!
//! Replays a fixed sequence of responses. Useful for testing and for driving
//! the agent without a model endpoint.

use super::{ModelInvoker, ModelResponse};
use crate::conversation::Conversation;
use crate::error::{Result, SwellError};
use crate::tools::ToolDeclaration;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A model invoker that returns pre-configured responses in order.
pub struct ScriptedInvoker {
    responses: Mutex<VecDeque<Result<ModelResponse>>>,
    seen: Mutex<Vec<Conversation>>,
}

impl ScriptedInvoker {
    /// Create a scripted invoker with a sequence of responses.
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Create a scripted invoker whose steps may fail.
    pub fn with_results(results: Vec<Result<ModelResponse>>) -> Self {
        Self {
            responses: Mutex::new(results.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Number of times the invoker was called.
    pub fn calls(&self) -> usize {
        self.seen.lock().map(|seen| seen.len()).unwrap_or(0)
    }

    /// Conversations passed to each call, in call order.
    pub fn conversations(&self) -> Vec<Conversation> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        conversation: &Conversation,
        _declarations: &[ToolDeclaration],
    ) -> Result<ModelResponse> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(conversation.clone());
        }

        let next = self
            .responses
            .lock()
            .map_err(|_| SwellError::ModelInvocation("Scripted invoker poisoned".to_string()))?
            .pop_front();

        next.unwrap_or_else(|| {
            Err(SwellError::ModelInvocation(
                "Scripted invoker has no responses left".to_string(),
            ))
        })
    }
}
