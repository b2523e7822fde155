//! Bookmark commands.

use super::{confirm, Context};
use crate::export::{self, ExportFormat};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

/// List every bookmark.
pub async fn bookmarks_list(ctx: &Context, format: &OutputFormat) -> Result<()> {
    let bookmarks = ctx.client.all_bookmarks().await?;

    match format {
        OutputFormat::Text => {
            if bookmarks.is_empty() {
                println!("No bookmarks found.");
                return Ok(());
            }
            println!("\nFound {} bookmarks:\n", bookmarks.len());
            for (i, bm) in bookmarks.iter().enumerate() {
                println!("{:>3}. {}", i + 1, output::truncate(&bm.title, 60));
                println!("     {}", bm.created_date());
            }
            println!();
        }
        OutputFormat::Json => output::print_json(&bookmarks)?,
    }
    Ok(())
}

/// Export every bookmark into `dir`. Returns the file and count, or `None`
/// when there was nothing to export.
pub async fn export_to(
    ctx: &Context,
    export_format: ExportFormat,
    dir: &Path,
) -> Result<Option<(PathBuf, usize)>> {
    let bookmarks = ctx.client.all_bookmarks().await?;
    if bookmarks.is_empty() {
        return Ok(None);
    }
    let content = export::render(&bookmarks, ctx.client.base_url(), export_format);
    let path = export::write_export(dir, export_format, &content)?;
    Ok(Some((path, bookmarks.len())))
}

pub async fn bookmarks_export(
    ctx: &Context,
    export_format: ExportFormat,
    out: Option<PathBuf>,
    format: &OutputFormat,
) -> Result<()> {
    let dir = ctx.export_dir(out);
    match export_to(ctx, export_format, &dir).await? {
        Some((path, count)) => output::print_success(
            &format!("Exported {} bookmarks to: {}", count, path.display()),
            format,
        ),
        None => output::print_success("No bookmarks to export.", format),
    }
    Ok(())
}

/// Delete every bookmark one by one. Returns `(deleted, failed)`.
async fn clear_all(ctx: &Context) -> Result<(usize, usize)> {
    let bookmarks = ctx.client.all_bookmarks().await?;
    let mut deleted = 0;
    let mut failed = 0;

    for bm in &bookmarks {
        match ctx.client.delete_bookmark(bm.id).await {
            Ok(()) => deleted += 1,
            Err(e) => {
                failed += 1;
                warn!(bookmark_id = bm.id, error = %e, "Failed to delete bookmark");
                eprintln!("Failed to delete bookmark {}: {}", bm.id, e);
            }
        }
    }
    Ok((deleted, failed))
}

pub async fn bookmarks_clear(ctx: &Context, yes: bool, format: &OutputFormat) -> Result<()> {
    if !yes && !confirm("Delete ALL bookmarks?") {
        output::print_success("Cancelled.", format);
        return Ok(());
    }

    let (deleted, failed) = clear_all(ctx).await?;
    let message = if failed == 0 {
        format!("Deleted {} bookmarks.", deleted)
    } else {
        format!("Deleted {} bookmarks, {} failed.", deleted, failed)
    };
    output::print_success(&message, format);
    Ok(())
}
