//! States and transitions of the agent loop.

use crate::conversation::ToolCallRequest;
use crate::model::ModelResponse;

/// Where the loop is.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    /// Waiting on the model's next decision.
    AwaitingModel,
    /// Running the tool calls requested by the last assistant message.
    ExecutingTools(Vec<ToolCallRequest>),
    /// The model produced a final answer.
    Done,
}

impl AgentState {
    pub fn phase(&self) -> AgentPhase {
        match self {
            AgentState::AwaitingModel => AgentPhase::AwaitingModel,
            AgentState::ExecutingTools(_) => AgentPhase::ExecutingTools,
            AgentState::Done => AgentPhase::Done,
        }
    }
}

/// Payload-free view of [`AgentState`], recorded once per state visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    AwaitingModel,
    ExecutingTools,
    Done,
}

impl std::fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentPhase::AwaitingModel => write!(f, "awaiting_model"),
            AgentPhase::ExecutingTools => write!(f, "executing_tools"),
            AgentPhase::Done => write!(f, "done"),
        }
    }
}

/// Routing decision taken after a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Run these tools, then ask the model again.
    Act(Vec<ToolCallRequest>),
    /// Stop with this answer.
    Finish(String),
}

/// Decide whether the loop continues with tool calls or stops.
pub fn should_continue(response: ModelResponse) -> Transition {
    match response {
        ModelResponse::ToolCallsRequested(calls) if !calls.is_empty() => Transition::Act(calls),
        ModelResponse::ToolCallsRequested(_) => Transition::Finish(String::new()),
        ModelResponse::FinalAnswer(text) => Transition::Finish(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_should_continue() {
        let call = ToolCallRequest::new("1", "get_marine_forecast", json!({"buoy_id": "46214"}));

        assert_eq!(
            should_continue(ModelResponse::ToolCallsRequested(vec![call.clone()])),
            Transition::Act(vec![call])
        );
        assert_eq!(
            should_continue(ModelResponse::FinalAnswer("Calm seas.".to_string())),
            Transition::Finish("Calm seas.".to_string())
        );
        assert_eq!(
            should_continue(ModelResponse::ToolCallsRequested(Vec::new())),
            Transition::Finish(String::new())
        );
    }
}
