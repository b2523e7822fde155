//! Forum client error types.
//!
//! Failures are classified once, where the HTTP status and body are read,
//! so callers branch on [`ErrorKind`] instead of inspecting message text.

use wreq::StatusCode;
use serde::Deserialize;
use session_cache_store::CacheError;
use thiserror::Error;

/// Marker Discourse puts in the body of a request rejected for a bad token.
const BAD_CSRF_MARKER: &str = "BAD CSRF";
/// Marker Discourse puts in rate-limit payloads.
const RATE_LIMIT_MARKER: &str = "rate_limit";
/// Longest body excerpt carried in an error.
const BODY_EXCERPT_LEN: usize = 300;

/// Coarse error taxonomy callers decide retry policy on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Anti-bot edge rejected the request.
    Blocked,
    /// Bad credentials or a login error payload.
    AuthFailure,
    /// Cached session missing, corrupt, mismatched or expired.
    CacheInvalid,
    /// Network failure or unexpected HTTP status.
    Transport,
    /// The response did not parse.
    Decode,
    /// The forum asked us to slow down.
    RateLimited,
    /// Bad input rejected before any request was sent.
    Validation,
}

/// Forum client error type.
#[derive(Error, Debug)]
pub enum ForumError {
    /// HTTP 403 from the bot-mitigation edge
    #[error("Blocked by the forum's anti-bot protection (HTTP 403) at {endpoint}")]
    Blocked { endpoint: String },

    /// Login rejected
    #[error("Login failed: {0}")]
    AuthFailure(String),

    /// Cached session could not be reused
    #[error("Cached session unusable: {0}")]
    CacheInvalid(#[from] CacheError),

    /// The CSRF token was refused; it has been refreshed for the next call
    #[error("CSRF token rejected at {endpoint}; token refreshed, retry the request")]
    CsrfExpired { endpoint: String },

    /// Rate-limited by the forum
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        wait_seconds: Option<u64>,
    },

    /// Unexpected HTTP status
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// HTTP transport error
    #[error("Transport error: {0}")]
    Transport(#[from] wreq::Error),

    /// Malformed JSON
    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Proxy environment variable holds an unusable value
    #[error("Invalid proxy in {var}: {reason}")]
    Proxy { var: String, reason: String },

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Input rejected before any request
    #[error("{0}")]
    Validation(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

impl ForumError {
    /// Map onto the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForumError::Blocked { .. } => ErrorKind::Blocked,
            ForumError::AuthFailure(_) | ForumError::InvalidStateTransition(_) => {
                ErrorKind::AuthFailure
            }
            ForumError::CacheInvalid(_) => ErrorKind::CacheInvalid,
            ForumError::CsrfExpired { .. }
            | ForumError::Http { .. }
            | ForumError::Transport(_) => ErrorKind::Transport,
            ForumError::Decode { .. } => ErrorKind::Decode,
            ForumError::RateLimited { .. } => ErrorKind::RateLimited,
            ForumError::Proxy { .. } | ForumError::InvalidUrl(_) | ForumError::Validation(_) => {
                ErrorKind::Validation
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.kind() == ErrorKind::Blocked
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }

    /// Returns true if repeating the same call later may succeed.
    ///
    /// Blocks are deliberately excluded: hammering the edge makes them worse.
    pub fn is_transient(&self) -> bool {
        match self {
            ForumError::CsrfExpired { .. } | ForumError::RateLimited { .. } => true,
            ForumError::Transport(e) => e.is_connect() || e.is_timeout(),
            ForumError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ForumError::Validation(message.into())
    }

    pub(crate) fn decode(endpoint: &str, source: serde_json::Error) -> Self {
        ForumError::Decode {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}

/// Result type alias using ForumError.
pub type ForumResult<T> = Result<T, ForumError>;

/// Error payload shape shared by Discourse endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub extras: Option<ErrorExtras>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorExtras {
    #[serde(default)]
    pub wait_seconds: Option<u64>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// The most human-readable message the payload carries.
    pub fn message(&self) -> Option<String> {
        if !self.errors.is_empty() {
            return Some(self.errors.join("; "));
        }
        self.error.clone()
    }
}

/// Classify a non-success response.
pub(crate) fn classify_failure(status: StatusCode, endpoint: &str, body: &str) -> ForumError {
    if status == StatusCode::FORBIDDEN {
        if body.contains(BAD_CSRF_MARKER) {
            return ForumError::CsrfExpired {
                endpoint: endpoint.to_string(),
            };
        }
        return ForumError::Blocked {
            endpoint: endpoint.to_string(),
        };
    }

    let parsed = ErrorBody::parse(body);
    let flagged_rate_limit = parsed.error_type.as_deref() == Some(RATE_LIMIT_MARKER)
        || body.contains(RATE_LIMIT_MARKER);

    if status == StatusCode::TOO_MANY_REQUESTS || flagged_rate_limit {
        return ForumError::RateLimited {
            message: parsed
                .message()
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            wait_seconds: parsed.extras.and_then(|e| e.wait_seconds),
        };
    }

    ForumError::Http {
        status: status.as_u16(),
        endpoint: endpoint.to_string(),
        body: excerpt(body),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_LEN {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_EXCERPT_LEN).collect();
    out.push('…');
    out
}
