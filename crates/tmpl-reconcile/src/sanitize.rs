//! Field sanitization
//!
//! Strips markup that carries no field content: HTML comments, references,
//! anything after a line break tag, and `{{lang|en|…}}` wrappers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").unwrap());
static REF_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<ref(?:\s[^>]*)?>.*?</ref\s*>").unwrap());
static REF_SELF_CLOSING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<ref(?:\s[^>]*)?/>").unwrap());
static LINE_BREAK_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<br\s*/?>.*").unwrap());
static LANG_EN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*lang\|\s*en\s*\|([^}]*)\}\}").unwrap());

/// Remove HTML comments (an unterminated comment runs to the end)
#[must_use]
pub fn strip_comments(text: &str) -> Cow<'_, str> {
    COMMENT.replace_all(text, "")
}

/// Reduce a field value to its plain content
#[must_use]
pub fn sanitize_field(text: &str) -> String {
    let text = REF_SELF_CLOSING.replace_all(text, "");
    let text = REF_PAIR.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");
    let text = LINE_BREAK_TAIL.replace(&text, "");
    match LANG_EN.captures(&text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Check if a value consists of comments and whitespace only
#[must_use]
pub fn is_bare_comment(text: &str) -> bool {
    text.contains("<!--") && strip_comments(text).trim().is_empty()
}
