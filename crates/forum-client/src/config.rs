//! Client construction settings.

use crate::models::TopPeriod;
use forum_config_and_utils::{Config, CoreResult, Paths};
use session_cache_store::SessionStore;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause after the warmup GET before logging in.
pub const DEFAULT_WARMUP_DELAY: Duration = Duration::from_secs(2);

/// Settings for [`crate::ForumClient::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Forum root without a trailing slash, e.g. `https://linux.do`.
    pub base_url: String,
    pub timeout: Duration,
    pub warmup_delay: Duration,
    /// Where cookies are cached between runs; `None` always logs in fresh.
    pub session_store: Option<SessionStore>,
    /// Period used when a caller asks for `top` without one.
    pub default_top_period: TopPeriod,
    /// Route through `HTTPS_PROXY`/`HTTP_PROXY` when set.
    pub use_system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: forum_config_and_utils::DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            warmup_delay: DEFAULT_WARMUP_DELAY,
            session_store: None,
            default_top_period: TopPeriod::default(),
            use_system_proxy: true,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Build from the user configuration, caching the session under the
    /// forum host's own file.
    pub fn from_config(config: &Config, paths: &Paths) -> CoreResult<Self> {
        let url = config.base_url()?;
        let host = url.host_str().unwrap_or_default().to_string();
        Ok(Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            warmup_delay: DEFAULT_WARMUP_DELAY,
            session_store: Some(SessionStore::new(paths.session_cache_file(&host))),
            default_top_period: TopPeriod::default(),
            use_system_proxy: true,
        })
    }

    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn with_warmup_delay(mut self, delay: Duration) -> Self {
        self.warmup_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect directly even when proxy variables are set.
    pub fn without_system_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }
}
