//! Agent runner with tool calling loop.

use super::state::{should_continue, AgentPhase, AgentState, Transition};
use crate::config::AgentSettings;
use crate::conversation::{Conversation, Message, ToolCallRequest};
use crate::error::{Result, SwellError};
use crate::model::ModelInvoker;
use crate::tools::{ToolCallRecord, ToolDeclaration, ToolExecutor, ToolRegistry};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Default cap on model calls per run.
const DEFAULT_MAX_TURNS: usize = 15;

/// Agent that alternates between the model and its tools until the model answers.
///
/// The invoker and registry are injected, so independent runs can share one
/// registry and tests can substitute a scripted model.
pub struct Agent {
    invoker: Arc<dyn ModelInvoker>,
    executor: ToolExecutor,
    max_turns: usize,
}

impl Agent {
    /// Create a new agent with the given model invoker and tools.
    pub fn new(invoker: Arc<dyn ModelInvoker>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            invoker,
            executor: ToolExecutor::new(registry),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Create an agent configured from settings.
    pub fn from_settings(
        invoker: Arc<dyn ModelInvoker>,
        registry: Arc<ToolRegistry>,
        settings: &AgentSettings,
    ) -> Self {
        Self::new(invoker, registry)
            .with_max_turns(settings.max_turns)
            .with_parallel_tool_calls(settings.parallel_tool_calls)
    }

    /// Set the maximum number of model calls per run. Zero removes the limit.
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    /// Run the tool calls of a turn concurrently.
    pub fn with_parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.executor = self.executor.with_parallel(parallel);
        self
    }

    /// Run the agent on a user question.
    pub async fn run(&self, question: &str) -> Result<AgentRun> {
        self.run_conversation(Conversation::from_question(question))
            .await
    }

    /// Run the agent on an existing conversation, typically a single human message.
    pub async fn run_conversation(&self, conversation: Conversation) -> Result<AgentRun> {
        let run_id = Uuid::new_v4();
        self.drive(run_id, conversation)
            .instrument(info_span!("agent_run", %run_id))
            .await
    }

    async fn drive(&self, run_id: Uuid, mut conversation: Conversation) -> Result<AgentRun> {
        let declarations: Vec<ToolDeclaration> =
            self.executor.registry().declarations().cloned().collect();

        let mut phases = Vec::new();
        let mut tool_calls = Vec::new();
        let mut model_calls = 0;
        let mut state = AgentState::AwaitingModel;

        loop {
            phases.push(state.phase());

            state = match state {
                AgentState::AwaitingModel => {
                    if self.max_turns > 0 && model_calls >= self.max_turns {
                        return Err(SwellError::MaxTurnsExceeded(self.max_turns));
                    }
                    model_calls += 1;
                    debug!("Agent turn {}", model_calls);

                    let response = self.invoker.invoke(&conversation, &declarations).await?;

                    match should_continue(response) {
                        Transition::Act(calls) => {
                            ensure_unique_ids(&calls)?;
                            conversation.push(Message::assistant_tool_calls(calls.clone()));
                            AgentState::ExecutingTools(calls)
                        }
                        Transition::Finish(answer) => {
                            conversation.push(Message::assistant(answer));
                            AgentState::Done
                        }
                    }
                }
                AgentState::ExecutingTools(calls) => {
                    let records = self.executor.execute_batch(&calls).await;
                    for record in &records {
                        conversation.push(Message::tool(&record.id, &record.output));
                    }

                    let pending = conversation.unanswered_tool_calls();
                    if !pending.is_empty() {
                        return Err(SwellError::Agent(format!(
                            "Tool calls left unanswered: {}",
                            pending.join(", ")
                        )));
                    }

                    tool_calls.extend(records);
                    AgentState::AwaitingModel
                }
                AgentState::Done => break,
            };
        }

        info!(
            "Agent finished after {} model call(s) and {} tool call(s)",
            model_calls,
            tool_calls.len()
        );

        Ok(AgentRun {
            run_id,
            conversation,
            phases,
            tool_calls,
            model_calls,
        })
    }
}

fn ensure_unique_ids(calls: &[ToolCallRequest]) -> Result<()> {
    let mut seen = HashSet::new();
    for call in calls {
        if !seen.insert(call.id.as_str()) {
            return Err(SwellError::ModelInvocation(format!(
                "Model reused tool call id '{}' within one turn",
                call.id
            )));
        }
    }
    Ok(())
}

/// Result of a completed agent run.
#[derive(Debug)]
pub struct AgentRun {
    /// Identifier attached to this run's log span.
    pub run_id: Uuid,
    /// Full transcript, starting with the human question.
    pub conversation: Conversation,
    /// States visited, in order.
    pub phases: Vec<AgentPhase>,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls used.
    pub model_calls: usize,
}

impl AgentRun {
    /// The model's final answer.
    pub fn answer(&self) -> Option<&str> {
        self.conversation.final_answer()
    }

    /// Number of times the loop entered a given phase.
    pub fn visits(&self, phase: AgentPhase) -> usize {
        self.phases.iter().filter(|p| **p == phase).count()
    }
}
