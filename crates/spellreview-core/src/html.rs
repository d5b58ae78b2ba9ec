//! HTML rendering of review context.

use crate::scanner::ContextFragments;

/// CSS class wrapped around the word under review.
pub const HIGHLIGHT_CLASS: &str = "word-highlight";

/// Escape text for safe inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

impl ContextFragments {
    /// Render the fragments as escaped HTML with the word highlighted.
    pub fn to_html(&self) -> String {
        format!(
            "{}<span class=\"{HIGHLIGHT_CLASS}\">{}</span>{}",
            escape_html(&self.before),
            escape_html(&self.word),
            escape_html(&self.after),
        )
    }
}
