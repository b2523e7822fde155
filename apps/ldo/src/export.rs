//! Bookmark export to txt, html or markdown.

use crate::output::truncate;
use anyhow::{Context, Result};
use forum_client::Bookmark;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Longest excerpt kept in the plain-text export.
const TXT_EXCERPT_MAX: usize = 200;

/// Export document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Html,
    #[default]
    Md,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Html => "html",
            ExportFormat::Md => "md",
        }
    }

    pub fn file_name(&self) -> String {
        format!("bookmarks.{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "html" => Ok(ExportFormat::Html),
            "md" | "markdown" => Ok(ExportFormat::Md),
            other => anyhow::bail!("Invalid format: {} (supported: txt, html, md)", other),
        }
    }
}

/// Absolute URL of a bookmark.
fn bookmark_url(base_url: &str, bookmark: &Bookmark) -> String {
    let path = &bookmark.bookmarkable_url;
    if path.starts_with("http://") || path.starts_with("https://") {
        path.clone()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    }
}

fn site_name(base_url: &str) -> String {
    url::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| base_url.to_string())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `bookmarks` as a complete document.
pub fn render(bookmarks: &[Bookmark], base_url: &str, format: ExportFormat) -> String {
    match format {
        ExportFormat::Txt => render_txt(bookmarks, base_url),
        ExportFormat::Html => render_html(bookmarks, base_url),
        ExportFormat::Md => render_md(bookmarks, base_url),
    }
}

fn render_txt(bookmarks: &[Bookmark], base_url: &str) -> String {
    let heading = format!("{} Bookmarks", site_name(base_url));
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading);
    let _ = writeln!(out, "{}\n", "=".repeat(heading.chars().count()));

    for (i, bm) in bookmarks.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, bm.title);
        let _ = writeln!(out, "   URL: {}", bookmark_url(base_url, bm));
        let _ = writeln!(out, "   Date: {}", bm.created_date());
        if !bm.excerpt.is_empty() {
            let _ = writeln!(out, "   {}", truncate(&bm.excerpt, TXT_EXCERPT_MAX));
        }
        out.push('\n');
    }
    out
}

const HTML_STYLE: &str = "\
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }
    h1 { color: #333; border-bottom: 2px solid #007bff; padding-bottom: 10px; }
    .bookmark { margin: 20px 0; padding: 15px; border: 1px solid #ddd; border-radius: 8px; }
    .title { font-size: 1.1em; font-weight: bold; margin-bottom: 8px; }
    .title a { color: #007bff; text-decoration: none; }
    .date { color: #666; font-size: 0.9em; }
    .excerpt { color: #444; margin-top: 10px; line-height: 1.5; }
";

fn render_html(bookmarks: &[Bookmark], base_url: &str) -> String {
    let site = escape_html(&site_name(base_url));
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str("  <meta charset=\"UTF-8\">\n");
    out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    let _ = writeln!(out, "  <title>{} Bookmarks</title>", site);
    let _ = write!(out, "  <style>\n{}  </style>\n</head>\n<body>\n", HTML_STYLE);
    let _ = writeln!(out, "  <h1>{} Bookmarks ({})</h1>", site, bookmarks.len());

    for bm in bookmarks {
        out.push_str("  <div class=\"bookmark\">\n");
        let _ = writeln!(
            out,
            "    <div class=\"title\"><a href=\"{}\" target=\"_blank\">{}</a></div>",
            escape_html(&bookmark_url(base_url, bm)),
            escape_html(&bm.title)
        );
        let _ = writeln!(out, "    <div class=\"date\">{}</div>", bm.created_date());
        if !bm.excerpt.is_empty() {
            // Excerpts arrive as server-rendered HTML.
            let _ = writeln!(out, "    <div class=\"excerpt\">{}</div>", bm.excerpt);
        }
        out.push_str("  </div>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_md(bookmarks: &[Bookmark], base_url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} Bookmarks\n", site_name(base_url));
    let _ = writeln!(out, "Total: {} bookmarks\n", bookmarks.len());
    out.push_str("---\n\n");

    for (i, bm) in bookmarks.iter().enumerate() {
        let _ = writeln!(
            out,
            "## {}. [{}]({})\n",
            i + 1,
            bm.title,
            bookmark_url(base_url, bm)
        );
        let _ = writeln!(out, "**Date**: {}\n", bm.created_date());
        if !bm.excerpt.is_empty() {
            let _ = writeln!(out, "> {}\n", bm.excerpt);
        }
        out.push_str("---\n\n");
    }
    out
}

/// Write an export into `dir`, creating it if needed. Returns the file path.
pub fn write_export(dir: &Path, format: ExportFormat, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create {}", dir.display()))?;
    let path = dir.join(format.file_name());
    std::fs::write(&path, content)
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(path)
}
