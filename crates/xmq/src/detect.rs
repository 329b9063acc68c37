/*
 * detect.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Guessing what kind of text a buffer holds.

use crate::scanner::is_token_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Xmq,
    Xml,
    Html,
    Json,
    /// Empty or whitespace-only input.
    Unknown,
}

/// Classify `text` by its first non-whitespace characters.
///
/// ```rust
/// use xmq::{detect_content_type, ContentType};
///
/// assert_eq!(detect_content_type("<x/>"), ContentType::Xml);
/// assert_eq!(detect_content_type("[1]"), ContentType::Json);
/// assert_eq!(detect_content_type("a = 1"), ContentType::Xmq);
/// ```
pub fn detect_content_type(text: &str) -> ContentType {
    let trimmed = text.trim_start_matches(|c: char| is_token_whitespace(c) || c == '\t');
    let Some(first) = trimmed.chars().next() else {
        return ContentType::Unknown;
    };

    if first == '<' {
        return if looks_like_html(trimmed) {
            ContentType::Html
        } else {
            ContentType::Xml
        };
    }

    if matches!(first, '{' | '[') || first.is_ascii_digit() {
        return ContentType::Json;
    }

    let word = trimmed.trim_end_matches(|c: char| is_token_whitespace(c));
    if matches!(word, "true" | "false" | "null") {
        return ContentType::Json;
    }

    ContentType::Xmq
}

fn looks_like_html(markup: &str) -> bool {
    if markup.starts_with("<?xml") {
        return false;
    }
    let head: String = markup
        .chars()
        .take(64)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<html") || head.starts_with("<!doctype html")
}
