//! File-backed session cache store.

use crate::{CacheError, CacheResult, SessionCache};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and writes one session cache file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache for `username`, judged against the current time.
    pub fn load(&self, username: &str) -> CacheResult<SessionCache> {
        self.load_at(username, Utc::now())
    }

    /// Load the cache for `username`, judged against `now`.
    ///
    /// Fails with `NotFound`, `Corrupt` or `Stale`; callers treat all three
    /// as "log in again".
    pub fn load_at(&self, username: &str, now: DateTime<Utc>) -> CacheResult<SessionCache> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        let cache: SessionCache =
            serde_json::from_str(&content).map_err(|e| CacheError::Corrupt(e.to_string()))?;

        cache.validate_at(username, now)?;

        debug!(
            path = %self.path.display(),
            cookies = cache.cookies.len(),
            "Loaded session cache"
        );
        Ok(cache)
    }

    /// Persist `cache`, replacing any previous file.
    ///
    /// Writes a sibling temp file with owner-only permissions and renames it
    /// over the target so readers never observe a half-written record.
    pub fn save(&self, cache: &SessionCache) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_vec_pretty(cache)
            .map_err(|e| CacheError::Corrupt(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = owner_only_options().open(&tmp_path)?;
            file.write_all(&content)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            cookies = cache.cookies.len(),
            "Saved session cache"
        );
        Ok(())
    }

    /// Remove the cache file. Missing files are not an error.
    pub fn clear(&self) -> CacheResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }
}

fn owner_only_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}
