//! Browser hand-off.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};

pub async fn browser(ctx: &Context, topic_id: u64, format: &OutputFormat) -> Result<()> {
    let url = open_topic(ctx, topic_id)?;
    output::print_success(&format!("Opened {}", url), format);
    Ok(())
}

/// Open a topic in the default browser, returning its URL.
pub fn open_topic(ctx: &Context, topic_id: u64) -> Result<String> {
    let url = ctx.client.topic_url(topic_id);
    open::that(&url).with_context(|| format!("Could not open browser for {}", url))?;
    Ok(url)
}
