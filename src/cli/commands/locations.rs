//! Locations command implementation.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use anyhow::Result;

/// Print the location table the model uses to pick buoy ids.
pub fn run_locations(settings: Settings) -> Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    Output::header(&format!("Locations ({})", prompts.agent.locations.len()));
    for location in &prompts.agent.locations {
        Output::kv(&location.buoy_id, &location.name);
    }

    Ok(())
}
