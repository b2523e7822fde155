//! Central JSONL file sink.
//!
//! Every ldo process (the CLI, the shell, the long-running agent) appends to
//! the same file. Lines are flushed as they complete so `tail -f` and other
//! processes never see half an event. When the file grows past
//! [`ROTATE_AT_BYTES`] at startup it is moved aside to `<name>.1`.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Size past which the log is rotated when a process starts.
pub const ROTATE_AT_BYTES: u64 = 20 * 1024 * 1024;

fn default_log_path() -> io::Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ldo").join("logs").join("ldo.jsonl"))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found"))
}

fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".1");
    path.with_file_name(name)
}

/// Move `path` to `<path>.1` if it is larger than `limit`. Returns whether
/// a rotation happened.
fn rotate_if_larger(path: &Path, limit: u64) -> io::Result<bool> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > limit => {
            std::fs::rename(path, rotated_path(path))?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Shared append-only handle on the log file.
///
/// Cloning is cheap; all clones write through one buffer.
#[derive(Clone)]
pub struct AppendLog {
    file: Arc<Mutex<BufWriter<File>>>,
}

impl AppendLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }
}

impl Write for AppendLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.file.lock();
        let written = file.write(buf)?;
        if buf[..written].ends_with(b"\n") {
            file.flush()?;
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for AppendLog {
    type Writer = AppendLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the JSONL file layer, plus a compact stderr layer when asked.
pub fn init_dev_subscriber(config: &LogConfig) -> io::Result<()> {
    let log_path = match config.log_path.clone() {
        Some(path) => path,
        None => default_log_path()?,
    };

    let rotated = rotate_if_larger(&log_path, ROTATE_AT_BYTES)?;
    let log = AppendLog::open(&log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), log)
        .with_filter(env_filter(&config.default_level));

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    tracing::debug!(
        log_path = %log_path.display(),
        rotated,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_log_keeps_earlier_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("ldo.jsonl");

        let mut log = AppendLog::open(&path).unwrap();
        log.write_all(b"{\"n\":1}\n").unwrap();
        drop(log);

        let mut log = AppendLog::open(&path).unwrap();
        log.write_all(b"{\"n\":2}\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"n\":1}\n{\"n\":2}\n");
    }

    #[test]
    fn test_partial_line_is_flushed_on_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ldo.jsonl");

        let mut log = AppendLog::open(&path).unwrap();
        log.write_all(b"{\"half\":").unwrap();
        log.write_all(b"true}\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"half\":true}\n");
    }

    #[test]
    fn test_rotation_only_past_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ldo.jsonl");

        assert!(!rotate_if_larger(&path, 10).unwrap());

        std::fs::write(&path, "0123456789").unwrap();
        assert!(!rotate_if_larger(&path, 10).unwrap());

        std::fs::write(&path, "0123456789abc").unwrap();
        assert!(rotate_if_larger(&path, 10).unwrap());
        assert!(!path.exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ldo.jsonl.1")).unwrap(),
            "0123456789abc"
        );
    }
}
