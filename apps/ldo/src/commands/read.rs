//! Reading a topic.

use super::Context;
use crate::output::{self, OutputFormat};
use crate::text::html_to_text;
use anyhow::Result;
use forum_client::Post;
use topic_pager::{LoadMoreOutcome, TopicPager};

/// Print a topic's first batch, every post with `all`, or a single floor.
pub async fn read(
    ctx: &Context,
    topic_id: u64,
    floor: Option<u32>,
    all: bool,
    format: &OutputFormat,
) -> Result<()> {
    let mut pager = TopicPager::open(&ctx.client, topic_id).await?;

    if let Some(floor) = floor {
        let post = pager.view_floor(&ctx.client, floor).await?;
        match format {
            OutputFormat::Text => print_post(&post),
            OutputFormat::Json => output::print_json(&post)?,
        }
        return Ok(());
    }

    if all {
        while let LoadMoreOutcome::Loaded { .. } = pager.load_more(&ctx.client).await? {}
    }

    match format {
        OutputFormat::Text => {
            let detail = pager.detail();
            output::print_heading(&detail.title);
            output::print_row("Topic", &detail.id.to_string());
            output::print_row("Posts", &detail.posts_count.to_string());
            output::print_row("URL", &ctx.client.topic_url(detail.id));
            for post in pager.posts() {
                print_post(post);
            }
            if !pager.is_fully_loaded() {
                println!(
                    "Showing {}/{} posts. Use --all or --floor N for the rest.",
                    pager.loaded_count(),
                    pager.posts_count()
                );
            }
        }
        OutputFormat::Json => output::print_json(pager.detail())?,
    }
    Ok(())
}

/// One post as a framed block, shared with the shell.
pub fn print_post(post: &Post) {
    let time = post
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("{}", "=".repeat(80));
    println!(
        "Floor #{} | Author: @{} | Time: {}",
        post.post_number, post.username, time
    );
    output::print_divider();
    println!("{}", html_to_text(&post.cooked));
    println!("{}", "=".repeat(80));

    let likes = post.like_count();
    if post.is_liked() {
        println!("Status: Liked ({} likes)", likes);
    } else if likes > 0 {
        println!("Likes: {}", likes);
    }
}
