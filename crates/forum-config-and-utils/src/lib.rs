//! Configuration, paths, credentials and logging bootstrap shared by the
//! forum client, the lottery agent and the `ldo` CLI.

mod config;
mod credentials;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use credentials::{Credentials, PASSWORD_ENV, USERNAME_ENV};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
