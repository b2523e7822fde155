//! The cached session record and its freshness rules.

use crate::{CacheError, CacheResult, StaleReason};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum age of a reusable session cache.
pub const MAX_SESSION_AGE_DAYS: i64 = 7;

/// One cookie as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StoredCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    /// Split a request `Cookie` header (`a=1; b=2`) into cookies.
    ///
    /// Pairs without `=` or with an empty name are skipped.
    pub fn parse_header(header: &str) -> Vec<StoredCookie> {
        header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some(StoredCookie::new(name, value.trim()))
            })
            .collect()
    }

    /// Render as a `Set-Cookie` value suitable for re-installing into a jar.
    pub fn to_set_cookie(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        out.push_str("; Path=");
        out.push_str(self.path.as_deref().unwrap_or("/"));
        out
    }
}

/// Durable record of a prior login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCache {
    pub cookies: Vec<StoredCookie>,
    pub username: String,
    pub saved_at: DateTime<Utc>,
}

impl SessionCache {
    /// A cache record stamped with the current time.
    pub fn new(username: impl Into<String>, cookies: Vec<StoredCookie>) -> Self {
        Self {
            cookies,
            username: username.into(),
            saved_at: Utc::now(),
        }
    }

    /// Age of the record relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.saved_at
    }

    /// Check that the record may be reused by `username` at `now`.
    pub fn validate_at(&self, username: &str, now: DateTime<Utc>) -> CacheResult<()> {
        if self.username != username {
            return Err(CacheError::Stale(StaleReason::UsernameMismatch {
                cached: self.username.clone(),
                requested: username.to_string(),
            }));
        }

        let age = self.age_at(now);
        if age > Duration::days(MAX_SESSION_AGE_DAYS) {
            return Err(CacheError::Stale(StaleReason::Expired {
                age_hours: age.num_hours(),
            }));
        }

        Ok(())
    }
}
