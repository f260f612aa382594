//! CLI module for Swell.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Swell - marine forecasts from a tool-calling agent
///
/// Ask about ocean conditions in plain language; the agent looks up live buoy
/// observations and answers.
#[derive(Parser, Debug)]
#[command(name = "swell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question and print the full agent transcript
    Ask {
        /// The question to ask (e.g., "What are the waves like at Mavericks?")
        question: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum model calls before giving up (0 for no limit)
        #[arg(long)]
        max_turns: Option<usize>,

        /// Run the tool calls of a turn concurrently
        #[arg(long)]
        parallel: bool,

        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read the latest wave conditions for a buoy directly
    Forecast {
        /// NDBC buoy id (e.g., 46214)
        buoy_id: String,
    },

    /// List known locations and their buoy ids
    Locations,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}
