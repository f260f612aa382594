//! Ask command implementation.

use crate::agent::Agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::model::OpenAIInvoker;
use crate::tools::default_registry;
use anyhow::Result;
use std::sync::Arc;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_turns: Option<usize>,
    parallel: bool,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.model.name = model;
    }
    if let Some(max_turns) = max_turns {
        settings.agent.max_turns = max_turns;
    }
    settings.agent.parallel_tool_calls |= parallel;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let registry = Arc::new(default_registry(&settings.forecast)?);
    let invoker = Arc::new(OpenAIInvoker::from_settings(&settings.model, &prompts)?);
    let agent = Agent::from_settings(invoker, registry, &settings.agent);

    let spinner = Output::spinner("Checking the buoys...");

    match agent.run(question).await {
        Ok(run) => {
            spinner.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&run.conversation)?);
            } else {
                Output::transcript(&run.conversation);
                println!();
                Output::info(&format!(
                    "Completed in {} model call(s), {} tool call(s)",
                    run.model_calls,
                    run.tool_calls.len()
                ));
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Agent failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
