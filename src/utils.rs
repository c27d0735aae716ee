//! Utility functions for text normalization and logging.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing and length capping for scraped text
//! - Markup sniffing to tell HTML apart from other payloads
//! - String truncation for log previews

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum characters kept from any scraped text field.
pub const MAX_TEXT_CHARS: usize = 500;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// An opening, closing, comment or doctype tag.
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(?:[A-Za-z][A-Za-z0-9-]*|/[A-Za-z]|!)").unwrap());

/// Clean and normalize text scraped from a DOM node.
///
/// Collapses every whitespace run to a single space, trims the ends, drops
/// control characters, and caps the result at [`MAX_TEXT_CHARS`] characters.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  Breaking:\n\n  rates   cut "), "Breaking: rates cut");
/// ```
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    collapsed
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_TEXT_CHARS)
        .collect()
}

/// Whether a body contains at least one tag.
pub fn looks_like_markup(body: &str) -> bool {
    TAG.is_match(body)
}

/// Shorten a page body (or any text) to a log-sized preview.
///
/// # Arguments
///
/// * `s` - Text to preview, typically a fetched body
/// * `max` - Byte budget for the preview; cut back to a char boundary if needed
///
/// # Returns
///
/// `s` unchanged when it fits, otherwise its first `max` bytes followed by
/// `"…(+N bytes)"` for the dropped remainder.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("<p>ok</p>", 120), "<p>ok</p>");
/// assert_eq!(truncate_for_log("{\"stories\": []}", 4), "{\"st…(+11 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
