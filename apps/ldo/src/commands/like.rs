//! Like toggling.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use topic_pager::{LikeOutcome, TopicPager};

/// Toggle the like on one floor of a topic.
pub async fn like(ctx: &Context, topic_id: u64, floor: u32, format: &OutputFormat) -> Result<()> {
    let mut pager = TopicPager::open(&ctx.client, topic_id).await?;
    let LikeOutcome { liked, post } = pager.toggle_like(&ctx.client, floor).await?;

    match format {
        OutputFormat::Text => {
            let message = if liked {
                format!("Liked floor #{}", post.post_number)
            } else {
                format!("Unliked floor #{}", post.post_number)
            };
            output::print_success(&message, format);
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "topic_id": topic_id,
            "post_id": post.id,
            "floor": post.post_number,
            "liked": liked,
            "like_count": post.like_count(),
        }))?,
    }
    Ok(())
}
