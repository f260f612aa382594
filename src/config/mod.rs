//! Configuration module for Swell.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Location, Prompts};
pub use settings::{
    AgentSettings, ForecastSettings, GeneralSettings, ModelSettings, PromptSettings, Settings,
};
