//! Full-text search.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use forum_client::SearchPage;

pub async fn search(ctx: &Context, query: &str, page: u32, format: &OutputFormat) -> Result<()> {
    let results = ctx.client.search(query, page).await?;
    match format {
        OutputFormat::Text => print_search_page(&results),
        OutputFormat::Json => output::print_json(&results)?,
    }
    Ok(())
}

/// Numbered result list, shared with the shell.
pub fn print_search_page(page: &SearchPage) {
    if page.results.is_empty() {
        println!("No results found for '{}'", page.query);
        return;
    }

    println!(
        "\nSearch results for '{}' (page {}):",
        page.query, page.page
    );
    output::print_divider();
    for (i, result) in page.results.iter().enumerate() {
        println!(
            "{:>3}. @{:<15} [Topic #{}, Floor #{}] ❤️ {}",
            i + 1,
            result.username,
            result.topic_id,
            result.post_number,
            result.like_count
        );
        if !result.topic_title.is_empty() {
            println!("     {}", output::truncate(&result.topic_title, 70));
        }
        println!("     {}", output::truncate(&result.blurb, 70));
        println!();
    }
    output::print_divider();

    match page.next_page {
        Some(next) => println!("Page {} | more results on page {}", page.page, next),
        None => println!("Page {} | no more results", page.page),
    }
}
