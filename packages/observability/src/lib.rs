//! # Observability
//!
//! Centralized logging for the ldo workspace.
//!
//! Binaries call `observability::init_with_config()` once at startup and use
//! standard `tracing` macros everywhere else. Library crates never install a
//! subscriber of their own.
//!
//! ## Dev Mode
//!
//! With the default `dev` feature every process appends structured JSONL to
//! one central file, `~/.ldo/logs/ldo.jsonl`:
//!
//! - `tail -f ~/.ldo/logs/ldo.jsonl | jq` while the agent runs
//! - `jq 'select(.service == "lottery-agent")'` to split services apart
//!
//! Multi-process safety comes from append-only writes flushed per line.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "lottery-agent".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;

pub use json_layer::{JsonLayer, LogEntry};

use std::path::PathBuf;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "ldo", "lottery-agent").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.ldo/logs/ldo.jsonl` in dev mode.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with default settings.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// If the central log file cannot be opened the call falls back to the
/// compact stderr subscriber instead of aborting the process.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        match dev::init_dev_subscriber(&config) {
            Ok(()) => return,
            Err(e) => {
                eprintln!("observability: central log file unavailable ({e}), using stderr");
            }
        }
    }

    init_stderr_subscriber(&config);
}

fn init_stderr_subscriber(config: &LogConfig) {
    use tracing_subscriber::util::SubscriberInitExt;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish()
        .try_init();
}

/// Re-export tracing macros for convenience.
/// Services can use `observability::info!()` or `tracing::info!()`.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
