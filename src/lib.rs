//! Swell - a tool-calling marine forecast agent
//!
//! Swell answers natural-language questions about ocean conditions by letting a
//! language model decide, turn by turn, whether to answer directly or to call a
//! tool that reads live buoy observations.
//!
//! # Architecture
//!
//! - `conversation` - Messages, tool-call requests and the append-only transcript
//! - `tools` - Tool trait, registry, executor and the marine forecast tool
//! - `model` - Model invoker abstraction and the OpenAI implementation
//! - `agent` - The agent loop state machine
//! - `config` - Settings and prompt templates
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use swell::agent::Agent;
//! use swell::config::{Prompts, Settings};
//! use swell::model::OpenAIInvoker;
//! use swell::tools::{MarineForecastTool, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let prompts = Prompts::default();
//!
//!     let mut registry = ToolRegistry::new();
//!     registry.register(Arc::new(MarineForecastTool::from_settings(&settings.forecast)?))?;
//!
//!     let invoker = OpenAIInvoker::from_settings(&settings.model, &prompts)?;
//!     let agent = Agent::new(Arc::new(invoker), Arc::new(registry));
//!
//!     let run = agent.run("What are the waves like at Mavericks?").await?;
//!     println!("{}", run.answer().unwrap_or_default());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod model;
pub mod openai;
pub mod tools;

pub use error::{Result, SwellError, ToolExecutionError};
