//! Forum login credentials read from the environment.

use crate::{CoreError, CoreResult};
use std::fmt;

/// Environment variable holding the forum username.
pub const USERNAME_ENV: &str = "LINUXDO_USERNAME";
/// Environment variable holding the forum password.
pub const PASSWORD_ENV: &str = "LINUXDO_PASSWORD";

/// Username/password pair used for the session login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read credentials from `LINUXDO_USERNAME` / `LINUXDO_PASSWORD`.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup. Both values are trimmed
    /// and must be non-empty.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(CoreError::MissingCredential(name))
        };

        Ok(Self {
            username: fetch(USERNAME_ENV)?,
            password: fetch(PASSWORD_ENV)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
