//! Input normalization applied at store write boundaries.
//!
//! Titles and incoming message text are stripped of HTML markup before
//! persistence, independent of the transport that delivered them.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

/// Remove HTML tags and collapse the result to trimmed plain text.
pub fn strip_html(input: &str) -> String {
    let without_tags = TAG_RE.replace_all(input, "");
    without_tags
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
