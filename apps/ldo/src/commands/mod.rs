//! CLI command implementations.

mod bookmarks;
mod browser;
mod like;
mod read;
mod reply;
mod search;
mod topics;

pub use bookmarks::{bookmarks_clear, bookmarks_export, bookmarks_list, export_to};
pub use browser::{browser, open_topic};
pub use like::like;
pub use read::{print_post, read};
pub use reply::{read_message, reply};
pub use search::{print_search_page, search};
pub use topics::{print_topics, topics};

use anyhow::{Context as _, Result};
use forum_client::{ClientConfig, ForumClient};
use forum_config_and_utils::{Config, Credentials, Paths};
use std::path::PathBuf;
use tracing::debug;

/// Everything a command needs: an authenticated client plus local settings.
pub struct Context {
    pub client: ForumClient,
    pub config: Config,
    pub paths: Paths,
}

impl Context {
    /// Connect using cached cookies or a fresh login.
    pub async fn connect(config: Config, paths: Paths, credentials: &Credentials) -> Result<Self> {
        paths.ensure_dirs()?;
        let client_config = ClientConfig::from_config(&config, &paths)?;
        let client = ForumClient::connect(client_config, credentials)
            .await
            .context("Could not connect to the forum")?;
        debug!(username = %client.username(), origin = ?client.origin(), "Connected");
        Ok(Self {
            client,
            config,
            paths,
        })
    }

    /// Where bookmark exports go: `--out`, then config, then the download dir.
    pub fn export_dir(&self, out: Option<PathBuf>) -> PathBuf {
        out.unwrap_or_else(|| self.config.export_dir(&self.paths))
    }
}

/// Ask user for confirmation.
pub fn confirm(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} [y/N] ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    is_yes(&input)
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
