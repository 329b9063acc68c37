/*
 * quote.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Quoted text: removing incidental indentation when parsing, and choosing
//! a delimiter and layout that survives that removal when printing.
//!
//! A quoted value may span several lines and be indented to line up with
//! the code around it:
//!
//! ```text
//! poem = '
//!        Roses are red,
//!          violets are blue.
//!        '
//! ```
//!
//! The indentation shared by the interior lines is not part of the value,
//! so the text above is `"Roses are red,\n  violets are blue."`.

use std::borrow::Cow;

/// A physical line inside the working region of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Line {
    start: usize,
    stop: usize,
    trim: bool,
    has_trailing_nl: bool,
}

/// The measurements taken over a quote before reassembling it.
#[derive(Debug, Default)]
struct QuoteSpan {
    leading_nl_count: usize,
    trailing_nl_count: usize,
    min_indent: usize,
    lines: Vec<Line>,
}

/// Normalize line endings to `\n`.
fn unify_newlines(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Remove incidental indentation from the content of a quote whose
/// delimiters have already been stripped.
pub fn normalize_quote(raw: &str) -> String {
    let text = unify_newlines(raw);
    let text = text.as_ref();
    if !text.contains('\n') {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let len = bytes.len();

    let mut last_leading_nl = None;
    let mut leading_nl_count = 0;
    let mut i = 0;
    while i < len && matches!(bytes[i], b' ' | b'\n') {
        if bytes[i] == b'\n' {
            last_leading_nl = Some(i);
            leading_nl_count += 1;
        }
        i += 1;
    }
    if i == len {
        // Nothing but spaces and newlines collapses to one newline fewer.
        return "\n".repeat(leading_nl_count - 1);
    }

    let mut first_trailing_nl = None;
    let mut trailing_nl_count = 0;
    let mut last_indent = None;
    let mut j = len;
    while j > 0 && matches!(bytes[j - 1], b' ' | b'\n') {
        j -= 1;
        if bytes[j] == b'\n' {
            first_trailing_nl = Some(j);
            trailing_nl_count += 1;
            if last_indent.is_none() {
                last_indent = Some(len - j - 1);
            }
        }
    }

    let (start, mut first_line) = match last_leading_nl {
        Some(nl) => (nl, false),
        None => (0, true),
    };
    let stop = first_trailing_nl.filter(|&s| s >= start).unwrap_or(len);

    let mut span = QuoteSpan {
        leading_nl_count,
        trailing_nl_count,
        ..QuoteSpan::default()
    };
    let mut min_indent: Option<usize> = None;
    let mut line_start = start;
    let mut i = start;
    while i < stop {
        if bytes[i] == b'\n' {
            if i != start {
                span.lines.push(Line {
                    start: line_start,
                    stop: i,
                    trim: !first_line,
                    has_trailing_nl: true,
                });
                first_line = false;
            }
            line_start = i + 1;
            if line_start >= stop {
                break;
            }
            let spaces = bytes[line_start..stop]
                .iter()
                .take_while(|&&b| b == b' ')
                .count();
            let next = line_start + spaces;
            if next < stop && bytes[next] != b'\n' {
                min_indent = Some(min_indent.map_or(spaces, |m| m.min(spaces)));
            }
            i = next;
            continue;
        }
        i += 1;
    }
    if line_start < stop {
        span.lines.push(Line {
            start: line_start,
            stop,
            trim: !first_line,
            has_trailing_nl: false,
        });
    }

    let mut min_indent = min_indent.unwrap_or(0);
    if let Some(ceiling) = last_indent.filter(|&n| n > 0) {
        min_indent = min_indent.min(ceiling);
    }
    span.min_indent = min_indent;

    reassemble(text, &span)
}

fn reassemble(text: &str, span: &QuoteSpan) -> String {
    let mut out = String::with_capacity(text.len());
    for _ in 1..span.leading_nl_count {
        out.push('\n');
    }
    for line in &span.lines {
        let len = line.stop - line.start;
        if line.trim && len >= span.min_indent {
            out.push_str(&text[line.start + span.min_indent..line.stop]);
        } else {
            out.push_str(&text[line.start..line.stop]);
        }
        if line.has_trailing_nl {
            out.push('\n');
        }
    }
    for _ in 1..span.trailing_nl_count {
        out.push('\n');
    }
    out
}

/// The content of a raw quote token, without its delimiter runs.
pub fn strip_delimiters(raw: &str) -> &str {
    let Some(q) = raw.chars().next() else {
        return raw;
    };
    let depth = raw.chars().take_while(|&c| c == q).count();
    if depth == 2 && raw.len() == 2 {
        return "";
    }
    if raw.len() < 2 * depth {
        return "";
    }
    &raw[depth..raw.len() - depth]
}

/// Longest run of `c` in `text`.
pub fn max_run(text: &str, c: char) -> usize {
    let mut best = 0;
    let mut run = 0;
    for x in text.chars() {
        if x == c {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

/// Number of `q` characters needed to delimit `text`. A run of two would
/// read as the empty quote, so it becomes three.
pub fn quote_depth(text: &str, q: char) -> usize {
    match max_run(text, q) + 1 {
        2 => 3,
        n => n,
    }
}

/// How a multi-line quote is laid out on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteLayout {
    /// The text exactly as it is, between the delimiters.
    Inline,
    /// First line right after the opening delimiter, the remaining lines
    /// indented to the column just after it.
    Aligned,
    /// A newline after the opening delimiter, every line indented to the
    /// delimiter column, and the closing delimiter on a line of its own.
    Block,
}

/// Quote `text` with `q` using `layout`, with the opening delimiter placed
/// at column `col` (0-based). Returns `None` when the result would not
/// read back as `text`.
pub fn quote_with(text: &str, q: char, layout: QuoteLayout, col: usize) -> Option<String> {
    if text.is_empty() {
        return Some(format!("{q}{q}"));
    }
    if text.len() > 1 && text.bytes().all(|b| b == b'\n') {
        // Newlines alone read back one fewer.
        return Some(format!("{q}\n{text}{q}"));
    }
    let depth = quote_depth(text, q);
    let delimiter: String = std::iter::repeat_n(q, depth).collect();
    let content = match layout {
        QuoteLayout::Inline => {
            if text.starts_with(q) || text.ends_with(q) {
                return None;
            }
            text.to_string()
        }
        QuoteLayout::Aligned => {
            if text.starts_with(q) || text.ends_with(q) {
                return None;
            }
            indent_lines(text, col + depth, false)
        }
        QuoteLayout::Block => {
            let mut content = String::from("\n");
            content.push_str(&indent_lines(text, col, true));
            content.push('\n');
            content.push_str(&" ".repeat(col));
            content
        }
    };
    if normalize_quote(&content) != text {
        return None;
    }
    Some(format!("{delimiter}{content}{delimiter}"))
}

/// Indent every line after the first (or every line, with `first`) by
/// `width` spaces. Empty lines stay empty.
pub(crate) fn indent_lines(text: &str, width: usize, first: bool) -> String {
    let pad = " ".repeat(width);
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if (i > 0 || first) && !line.is_empty() {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    out
}

/// Pick the first lossless single quote for `text` at column `col`.
///
/// The quote character the text contains fewer of is tried first.
/// Single-line text is only tried inline. Multi-line text
/// prefers the aligned layout, then the block layout, then inline. In
/// compact output only the inline layout is used.
pub fn quote_text(text: &str, col: usize, compact: bool) -> Option<String> {
    let layouts: &[QuoteLayout] = if compact || !text.contains('\n') {
        &[QuoteLayout::Inline]
    } else {
        &[QuoteLayout::Aligned, QuoteLayout::Block, QuoteLayout::Inline]
    };
    let quotes = if max_run(text, '\'') > max_run(text, '"') {
        ['"', '\'']
    } else {
        ['\'', '"']
    };
    layouts.iter().find_map(|&layout| {
        quotes
            .iter()
            .find_map(|&q| quote_with(text, q, layout, col))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_literal_cases() {
        let cases = [
            ("HejsanHoppsan", "HejsanHoppsan"),
            ("\n   \n   Hejsan\n   Hoppsan\n \n   ", "\nHejsan\nHoppsan\n"),
            ("\n", ""),
            ("  \n \n    \n\n ", "\n\n\n"),
            (" x\n ", " x"),
            ("abc\n def", "abc\ndef"),
            ("\n    x\n  y\n    z\n", "  x\ny\n  z"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_quote(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_crlf_is_unified() {
        assert_eq!(normalize_quote("a\r\n b\r c"), "a\nb\nc");
    }

    #[test]
    fn test_last_line_indent_is_a_ceiling() {
        // Interior lines share 6 spaces, but the closing line only has 4.
        assert_eq!(normalize_quote("\n      a\n      b\n    "), "  a\n  b");
    }

    #[test]
    fn test_blank_interior_lines_do_not_affect_indent() {
        assert_eq!(normalize_quote("\n    a\n\n    b\n"), "a\n\nb");
    }

    #[test]
    fn test_normalize_is_idempotent_on_own_output() {
        for input in ["abc\n def", "\n    x\n  y\n    z\n", " x\n ", "\n  a\n  b\n  "] {
            let once = normalize_quote(input);
            assert_eq!(normalize_quote(&once), once);
        }
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("''"), "");
        assert_eq!(strip_delimiters("'x'"), "x");
        assert_eq!(strip_delimiters("'''a''b'''"), "a''b");
    }

    #[test]
    fn test_quote_depth_skips_two() {
        assert_eq!(quote_depth("plain", '\''), 1);
        assert_eq!(quote_depth("it's", '\''), 3);
        assert_eq!(quote_depth("a''b", '\''), 3);
        assert_eq!(quote_depth("a'''b", '\''), 4);
    }

    #[test]
    fn test_quote_text_single_line() {
        assert_eq!(quote_text("hello world", 0, false).as_deref(), Some("'hello world'"));
        assert_eq!(quote_text("'x", 0, false).as_deref(), Some("\"'x\""));
        assert_eq!(quote_text("'x\"", 0, false), None);
        assert_eq!(quote_text("", 4, false).as_deref(), Some("''"));
    }

    #[test]
    fn test_quote_text_multi_line_aligned() {
        let quoted = quote_text("one\ntwo", 4, false).unwrap();
        assert_eq!(quoted, "'one\n     two'");
        assert_eq!(normalize_quote(strip_delimiters(&quoted)), "one\ntwo");
    }

    #[test]
    fn test_quote_text_falls_back_to_block() {
        // The second line's own indentation would be eaten by the aligned layout.
        let quoted = quote_text("one\n  two", 2, false).unwrap();
        assert_eq!(quoted, "'\n  one\n    two\n  '");
        assert_eq!(normalize_quote(strip_delimiters(&quoted)), "one\n  two");
    }

    #[test]
    fn test_newlines_only_quote_carries_one_extra() {
        let quoted = quote_text("\n\n", 8, false).unwrap();
        assert_eq!(quoted, "'\n\n\n'");
        assert_eq!(normalize_quote(strip_delimiters(&quoted)), "\n\n");
        assert_eq!(quote_text("\n\n\n", 0, true).as_deref(), Some("'\n\n\n\n'"));
    }

    #[test]
    fn test_carriage_return_has_no_single_quote() {
        assert_eq!(quote_text("a\rb", 0, false), None);
    }
}
