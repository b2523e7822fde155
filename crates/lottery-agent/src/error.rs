//! Agent error types.

use forum_client::ForumError;
use thiserror::Error;

/// Agent error type.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Forum call failed
    #[error("Forum error: {0}")]
    Forum(#[from] ForumError),

    /// State file I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// State file serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rejected configuration
    #[error("Invalid agent configuration: {0}")]
    Config(String),

    /// The reply worker was already started
    #[error("Agent already started")]
    AlreadyStarted,
}

/// Result type alias using AgentError.
pub type AgentResult<T> = Result<T, AgentError>;
