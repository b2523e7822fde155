//! Replay-prevention memory, persisted after every mutation.

use crate::AgentResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// On-disk agent state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Topic id to the time a reply was recorded.
    #[serde(default)]
    pub replied_topics: BTreeMap<u64, DateTime<Utc>>,
    #[serde(default)]
    pub last_check: Option<DateTime<Utc>>,
}

/// Shared, file-backed [`AgentState`].
///
/// The scanner and the reply worker both write through here. One lock
/// covers the map and the file write, so writers never interleave.
/// Persistence failures are logged; the in-memory state stays
/// authoritative.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: Mutex<AgentState>,
}

impl StateStore {
    /// Load state from `path`. A missing or unreadable file yields an empty
    /// state.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<AgentState>(&content) {
                Ok(state) => {
                    info!(
                        path = %path.display(),
                        replied = state.replied_topics.len(),
                        "Loaded agent state"
                    );
                    state
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Agent state corrupt, starting empty");
                    AgentState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AgentState::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Agent state unreadable, starting empty");
                AgentState::default()
            }
        };

        Self {
            path,
            state: Mutex::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_replied(&self, topic_id: u64) -> bool {
        self.state.lock().unwrap().replied_topics.contains_key(&topic_id)
    }

    pub fn replied_count(&self) -> usize {
        self.state.lock().unwrap().replied_topics.len()
    }

    pub fn snapshot(&self) -> AgentState {
        self.state.lock().unwrap().clone()
    }

    /// Record a reply now. Returns false when the topic was already recorded.
    pub fn record_reply(&self, topic_id: u64) -> bool {
        self.record_reply_at(topic_id, Utc::now())
    }

    pub fn record_reply_at(&self, topic_id: u64, at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.replied_topics.contains_key(&topic_id) {
            return false;
        }
        state.replied_topics.insert(topic_id, at);
        self.persist_logged(&state);
        true
    }

    /// Merge topic ids known from the server. Returns how many were new.
    pub fn merge_remote(&self, topic_ids: impl IntoIterator<Item = u64>) -> usize {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        let mut added = 0;
        for id in topic_ids {
            if let std::collections::btree_map::Entry::Vacant(entry) =
                state.replied_topics.entry(id)
            {
                entry.insert(now);
                added += 1;
            }
        }
        if added > 0 {
            self.persist_logged(&state);
        }
        added
    }

    /// Drop records older than `retention` relative to `now`. Returns how
    /// many were removed.
    pub fn prune(&self, retention: Duration, now: DateTime<Utc>) -> usize {
        let threshold = now - retention;
        let mut state = self.state.lock().unwrap();
        let before = state.replied_topics.len();
        state.replied_topics.retain(|_, at| *at >= threshold);
        let removed = before - state.replied_topics.len();
        if removed > 0 {
            self.persist_logged(&state);
        }
        removed
    }

    pub fn mark_checked(&self, at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        state.last_check = Some(at);
        self.persist_logged(&state);
    }

    fn persist_logged(&self, state: &AgentState) {
        if let Err(e) = self.persist(state) {
            warn!(path = %self.path.display(), error = %e, "Failed to save agent state");
        }
    }

    fn persist(&self, state: &AgentState) -> AgentResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_vec_pretty(state)?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp_path)?;
            file.write_all(&content)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        debug!(replied = state.replied_topics.len(), "Saved agent state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path().join("state.json"));
        assert_eq!(store.replied_count(), 0);
        assert!(store.snapshot().last_check.is_none());
    }

    #[test]
    fn test_corrupt_file_is_empty_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{{{").unwrap();

        let store = StateStore::open(&path);
        assert_eq!(store.replied_count(), 0);
    }

    #[test]
    fn test_record_reply_persists_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::open(&path);

        assert!(store.record_reply(42));
        assert!(!store.record_reply(42));

        let reopened = StateStore::open(&path);
        assert!(reopened.has_replied(42));
        assert!(!reopened.has_replied(43));
    }

    #[test]
    fn test_reads_string_keyed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"replied_topics":{"123":"2024-05-01T10:00:00Z"},"last_check":"2024-05-01T10:05:00Z"}"#,
        )
        .unwrap();

        let store = StateStore::open(&path);
        assert!(store.has_replied(123));
        assert!(store.snapshot().last_check.is_some());
    }

    #[test]
    fn test_merge_remote_counts_new_ids_only() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path().join("state.json"));
        store.record_reply(1);

        assert_eq!(store.merge_remote([1, 2, 3]), 2);
        assert_eq!(store.merge_remote([2, 3]), 0);
        assert_eq!(store.replied_count(), 3);
    }

    #[test]
    fn test_prune_removes_old_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::open(&path);
        let now = Utc::now();

        store.record_reply_at(1, now - Duration::days(45));
        store.record_reply_at(2, now - Duration::days(29));
        store.record_reply_at(3, now);

        assert_eq!(store.prune(Duration::days(30), now), 1);
        assert!(!store.has_replied(1));
        assert!(store.has_replied(2));

        let reopened = StateStore::open(&path);
        assert_eq!(reopened.replied_count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_state_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path().join("state.json"));
        store.mark_checked(Utc::now());

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_unwritable_path_keeps_memory_state() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        let store = StateStore::open(blocker.join("state.json"));
        assert!(store.record_reply(7));
        assert!(store.has_replied(7));
    }
}
