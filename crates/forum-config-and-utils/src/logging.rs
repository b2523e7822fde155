//! Logging initialization.
//!
//! Thin wrapper over the observability package so every binary sets up
//! tracing the same way: JSONL to `~/.ldo/logs/ldo.jsonl`, level from
//! `RUST_LOG` or the configured default, service name on every line.

use crate::Paths;

/// Initialize logging for a named service.
///
/// # Arguments
///
/// * `service_name` - Written to every log line (`"ldo"`, `"lottery-agent"`)
/// * `level` - Default log level (trace, debug, info, warn, error)
/// * `also_stderr` - Mirror events to stderr (foreground processes)
///
/// # Example
///
/// ```ignore
/// init_logging("lottery-agent", "info", true);
/// tracing::info!("agent started");
/// ```
pub fn init_logging(service_name: &str, level: &str, also_stderr: bool) {
    let log_path = Paths::new().ok().map(|paths| paths.log_file());

    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        log_path,
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_and_whitespace_insensitive() {
        assert_eq!(parse_level(" DEBUG "), tracing::Level::DEBUG);
        assert_eq!(parse_level("Warning"), tracing::Level::WARN);
    }

    #[test]
    fn parse_level_unknown_defaults_to_info() {
        assert_eq!(parse_level(""), tracing::Level::INFO);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
    }

    #[test]
    fn normalized_level_is_a_valid_filter_directive() {
        assert_eq!(parse_level("WARNING").as_str().to_ascii_lowercase(), "warn");
    }
}
