//! Pager error types.

use forum_client::ForumError;
use thiserror::Error;

/// Pager error type.
#[derive(Error, Debug)]
pub enum PagerError {
    /// Floor outside `1..=posts_count`; rejected before any request
    #[error("Floor {floor} is out of range (1-{max})")]
    InvalidFloor { floor: u32, max: u32 },

    /// The server returned nothing for a floor it listed in the stream
    #[error("Floor {0} is unavailable (deleted or hidden)")]
    PostUnavailable(u32),

    /// Underlying forum call failed
    #[error(transparent)]
    Forum(#[from] ForumError),
}

/// Result type alias using PagerError.
pub type PagerResult<T> = Result<T, PagerError>;
