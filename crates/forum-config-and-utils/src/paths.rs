//! File system paths for the CLI and the agent.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the home directory.
const BASE_DIR_NAME: &str = ".ldo";
/// Agent state filename under the base directory.
const AGENT_STATE_FILE_NAME: &str = "lottery_agent_state.json";

/// Manages file system paths for forum tooling.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.ldo)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.ldo`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.ldo).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.ldo/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the directory holding cached forum sessions (~/.ldo/sessions).
    pub fn sessions_dir(&self) -> PathBuf {
        self.base_dir.join("sessions")
    }

    /// Get the cached session file for one forum host (~/.ldo/sessions/<host>.json).
    ///
    /// Every forum gets its own file so logging into a second forum never
    /// clobbers the first one's cookies.
    pub fn session_cache_file(&self, host: &str) -> PathBuf {
        self.sessions_dir()
            .join(format!("{}.json", sanitize_host(host)))
    }

    /// Get the lottery agent state file (~/.ldo/lottery_agent_state.json).
    pub fn agent_state_file(&self) -> PathBuf {
        self.base_dir.join(AGENT_STATE_FILE_NAME)
    }

    /// Get the logs directory (~/.ldo/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the central log file path (~/.ldo/logs/ldo.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("ldo.jsonl")
    }

    /// Default destination for exported bookmarks: the user's download
    /// directory, then the home directory, then the base directory.
    pub fn default_export_dir(&self) -> PathBuf {
        dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| self.base_dir.clone())
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.sessions_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

fn sanitize_host(host: &str) -> String {
    let cleaned: String = host
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
