//! Rendered post HTML to terminal text.

use regex::Regex;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

fn break_pattern() -> &'static Regex {
    static BREAK: OnceLock<Regex> = OnceLock::new();
    BREAK.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("static regex"))
}

/// Block-level markup that maps onto plain-text structure, applied in order.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("</p>", "\n\n"),
    ("</div>", "\n"),
    ("</li>", "\n"),
    ("<pre>", "\n```\n"),
    ("</pre>", "\n```\n"),
    ("<code>", "`"),
    ("</code>", "`"),
    ("<li>", "• "),
    ("<blockquote>", "\n> "),
    ("</blockquote>", "\n"),
];

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    // Last, so `&amp;lt;` decodes to `&lt;` and not `<`.
    ("&amp;", "&"),
];

/// Convert a post's `cooked` HTML to readable text.
pub fn html_to_text(html: &str) -> String {
    let mut text = break_pattern().replace_all(html, "\n").into_owned();
    for (from, to) in REPLACEMENTS {
        text = text.replace(from, to);
    }
    let mut text = tag_pattern().replace_all(&text, "").into_owned();
    for (from, to) in ENTITIES {
        text = text.replace(from, to);
    }

    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }

    lines.join("\n").trim().to_string()
}
