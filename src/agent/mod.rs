//! Agent loop: the decision / action / observation cycle.
//!
//! The model decides each turn whether to answer or to call tools; tool
//! results are fed back as observations until the model answers.

mod runner;
mod state;

pub use runner::{Agent, AgentRun};
pub use state::{should_continue, AgentPhase, AgentState, Transition};
