//! Posting replies.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use std::io::BufRead;

/// Reply to a topic, optionally to a specific floor.
///
/// Without `--message` the body is read from stdin.
pub async fn reply(
    ctx: &Context,
    topic_id: u64,
    to: Option<u32>,
    message: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let body = match message {
        Some(message) => message,
        None => {
            let stdin = std::io::stdin();
            let mut lines = Vec::new();
            for line in stdin.lock().lines() {
                lines.push(line?);
            }
            lines.join("\n")
        }
    };
    let body = body.trim();
    if body.is_empty() {
        anyhow::bail!("Reply is empty");
    }

    let created = ctx.client.create_post(topic_id, body, to).await?;
    match format {
        OutputFormat::Text => {
            if created.post_number > 0 {
                output::print_success(
                    &format!("Reply posted as floor #{}", created.post_number),
                    format,
                );
            } else {
                output::print_success("Reply posted", format);
            }
        }
        OutputFormat::Json => output::print_json(&created)?,
    }
    Ok(())
}

/// Read a multi-line message terminated by `END`.
///
/// Returns `None` on `CANCEL` or end of input with nothing typed.
pub fn read_message<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        match line {
            "END" => break,
            "CANCEL" => return Ok(None),
            _ => lines.push(line.to_string()),
        }
    }

    let message = lines.join("\n").trim().to_string();
    Ok(if message.is_empty() { None } else { Some(message) })
}
