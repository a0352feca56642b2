//! Error types for Reelcut.

use thiserror::Error;

/// Library-level error type for Reelcut operations.
#[derive(Error, Debug)]
pub enum ReelcutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid tool call: {0}")]
    InvalidToolCall(String),

    #[error("Tool server error: {0}")]
    ToolServer(String),

    #[error("Tool server unreachable: {0}")]
    ToolUnreachable(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Reelcut operations.
pub type Result<T> = std::result::Result<T, ReelcutError>;
