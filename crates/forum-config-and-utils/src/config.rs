//! Configuration management for the forum tooling.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default forum base URL.
pub const DEFAULT_BASE_URL: &str = "https://linux.do";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Main configuration, stored as `~/.ldo/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Forum base URL, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout applied to every request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Where `bookmarks export` writes files. Falls back to the download dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_export_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            bookmark_export_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from `paths.config_file()`, falling back to defaults
    /// when the file does not exist, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Apply `LDO_LOG_LEVEL`, `LDO_BASE_URL` and `LDO_BOOKMARK_DIR` overrides.
    ///
    /// The lookup is injected so tests never touch the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(level) = non_empty("LDO_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(base_url) = non_empty("LDO_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(dir) = non_empty("LDO_BOOKMARK_DIR") {
            self.bookmark_export_dir = Some(PathBuf::from(dir));
        }
    }

    /// Reject values that would only fail later, deep inside a request.
    pub fn validate(&self) -> CoreResult<()> {
        self.base_url()?;
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the forum base URL as a parsed URL.
    pub fn base_url(&self) -> CoreResult<Url> {
        let url = Url::parse(self.base_url.trim_end_matches('/'))?;
        if url.host_str().is_none() {
            return Err(CoreError::Config(format!(
                "base_url has no host: {}",
                self.base_url
            )));
        }
        Ok(url)
    }

    /// Directory for bookmark exports, honoring the configured override.
    pub fn export_dir(&self, paths: &Paths) -> PathBuf {
        self.bookmark_export_dir
            .clone()
            .unwrap_or_else(|| paths.default_export_dir())
    }
}
