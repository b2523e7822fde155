//! Topic listing commands.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use forum_client::{Topic, TopicFilter};

/// List topics, following continuation pages until `limit` is reached.
pub async fn topics(ctx: &Context, filter: TopicFilter, limit: usize, format: &OutputFormat) -> Result<()> {
    let mut list = ctx.client.list_topics(filter).await?;
    let mut topics: Vec<Topic> = list.topic_list.topics.clone();

    while topics.len() < limit {
        let Some(cursor) = list.more_cursor().map(str::to_string) else {
            break;
        };
        list = ctx.client.more_topics(&cursor).await?;
        if list.topics().is_empty() {
            break;
        }
        topics.extend(list.topic_list.topics.iter().cloned());
    }
    topics.truncate(limit);

    match format {
        OutputFormat::Text => print_topics(&topics, &filter, limit, list.more_cursor().is_some()),
        OutputFormat::Json => output::print_json(&topics)?,
    }
    Ok(())
}

/// Numbered topic table, shared with the shell's `ls`.
pub fn print_topics(topics: &[Topic], filter: &TopicFilter, limit: usize, has_more: bool) {
    if topics.is_empty() {
        println!("No topics loaded");
        return;
    }

    println!("Topics ({}):", filter);
    output::print_divider();
    for (i, topic) in topics.iter().take(limit).enumerate() {
        let mut flags = String::new();
        if topic.pinned {
            flags.push_str("[pinned] ");
        }
        if topic.closed {
            flags.push_str("[closed] ");
        }
        let title = output::truncate(&format!("{}{}", flags, topic.title), 50);
        println!(
            "{:>3}. {:<50}  Replies: {:>4}  Views: {:>6}",
            i + 1,
            title,
            topic.reply_count,
            topic.views
        );
    }
    output::print_divider();

    print!("Total: {} topics loaded", topics.len());
    if has_more {
        print!(" (use 'more' to load more)");
    }
    println!();
}
