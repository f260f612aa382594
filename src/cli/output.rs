//! CLI output formatting utilities.

use crate::conversation::{Conversation, Message};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Width of the transcript banners.
const BANNER_WIDTH: usize = 80;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print every message of a transcript.
    pub fn transcript(conversation: &Conversation) {
        for message in conversation {
            Self::message(message);
        }
    }

    /// Print one transcript message under a role banner.
    pub fn message(message: &Message) {
        println!("{}", style(banner(message.role())).bold());
        println!("{}", render_message(message));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

fn banner(role: &str) -> String {
    format!("{:=^width$}", format!(" {} Message ", role), width = BANNER_WIDTH)
}

/// Body of a message as shown under its banner.
fn render_message(message: &Message) -> String {
    match message {
        Message::Assistant {
            content,
            tool_calls,
        } if !tool_calls.is_empty() => {
            let mut out = String::new();
            if let Some(text) = content.as_deref().filter(|t| !t.is_empty()) {
                out.push_str(text);
                out.push('\n');
            }
            out.push_str("Tool Calls:");
            for call in tool_calls {
                out.push_str(&format!("\n  {} ({})\n Call ID: {}\n  Args:", call.name, call.id, call.id));
                match call.arguments.as_object() {
                    Some(args) => {
                        for (key, value) in args {
                            let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                            out.push_str(&format!("\n    {}: {}", key, value));
                        }
                    }
                    None => out.push_str(&format!("\n    {}", call.arguments)),
                }
            }
            out
        }
        Message::Tool {
            tool_call_id,
            content,
        } => format!("Call ID: {}\n\n{}", tool_call_id, content),
        other => format!("\n{}", other.content().unwrap_or_default()),
    }
}
