//! Session cache error types.

use std::path::PathBuf;
use thiserror::Error;

/// Why a readable cache was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// The cache belongs to another account.
    UsernameMismatch { cached: String, requested: String },
    /// The cache is older than the allowed age.
    Expired { age_hours: i64 },
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::UsernameMismatch { cached, requested } => {
                write!(f, "cached for '{}', requested '{}'", cached, requested)
            }
            StaleReason::Expired { age_hours } => write!(f, "saved {}h ago", age_hours),
        }
    }
}

/// Error type for session cache operations.
///
/// Every variant means the same thing to the client: log in again.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No cache file at the expected path
    #[error("Session cache not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but does not parse
    #[error("Session cache corrupt: {0}")]
    Corrupt(String),

    /// The cache parsed but may not be reused
    #[error("Session cache stale: {0}")]
    Stale(StaleReason),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
