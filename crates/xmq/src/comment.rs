/*
 * comment.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Comment delimiters.
//!
//! A line comment is `//` up to the end of the line. A block comment opens
//! with one or more slashes and an asterisk, and closes with an asterisk
//! followed by exactly as many slashes. That makes any comment text
//! expressible: if the text contains `*/`, open with `//*` instead.

use crate::quote::normalize_quote;

/// The text of a comment token with its delimiters removed.
///
/// Line comments drop `//` and one following space. Block comments drop
/// the opener and one space after it, and the closer and one space before
/// it. A continuation token (`* text */`) is stripped the same way.
pub fn strip_comment(raw: &str) -> &str {
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    let raw = raw.strip_suffix('\r').unwrap_or(raw);

    let opener_len = if let Some(rest) = raw.strip_prefix('*') {
        // Continuation: the opening asterisk alone.
        raw.len() - rest.len()
    } else {
        let slashes = raw.bytes().take_while(|&b| b == b'/').count();
        if raw.as_bytes().get(slashes) != Some(&b'*') {
            let body = &raw[2.min(raw.len())..];
            return body.strip_prefix(' ').unwrap_or(body);
        }
        slashes + 1
    };

    let trailing_slashes = raw.bytes().rev().take_while(|&b| b == b'/').count();
    let closer_len = trailing_slashes + 1;
    if raw.len() < opener_len + closer_len {
        return "";
    }
    let body = &raw[opener_len..raw.len() - closer_len];
    let body = body.strip_prefix(' ').unwrap_or(body);
    body.strip_suffix(' ').unwrap_or(body)
}

/// Comment text as stored in the tree.
pub fn comment_text(raw: &str, trim_none: bool) -> String {
    let stripped = strip_comment(raw);
    if trim_none {
        stripped.to_string()
    } else {
        normalize_quote(stripped)
    }
}

/// Slashes needed to close a block comment holding `text`: one more than
/// the longest run of slashes that follows an asterisk.
pub fn count_necessary_slashes(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut longest = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'*' {
            let run = bytes[i + 1..].iter().take_while(|&&b| b == b'/').count();
            longest = longest.max(run);
        }
    }
    longest + 1
}

/// Block comment delimiters for `text`.
pub fn block_delimiters(text: &str) -> (String, String) {
    let n = count_necessary_slashes(text);
    let slashes = "/".repeat(n);
    (format!("{slashes}*"), format!("*{slashes}"))
}
