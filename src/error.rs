//! Error types for Swell.

use thiserror::Error;

/// Library-level error type for Swell operations.
#[derive(Error, Debug)]
pub enum SwellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool already registered: {0}")]
    DuplicateToolName(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(#[from] ToolExecutionError),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Agent exceeded maximum turns ({0})")]
    MaxTurnsExceeded(usize),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Failures raised while a tool runs.
///
/// These never abort an agent run: the loop renders them into a tool
/// observation so the model can react on its next turn.
#[derive(Error, Debug)]
pub enum ToolExecutionError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Host unreachable: {0}")]
    Unreachable(String),

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Feed returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Malformed feed response: {0}")]
    MalformedResponse(String),

    #[error("No valid observation in feed for buoy {0}")]
    NoValidObservation(String),
}

/// Result type alias for Swell operations.
pub type Result<T> = std::result::Result<T, SwellError>;
