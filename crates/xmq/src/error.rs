/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for xmq parsing and the XML bridge.
//!
//! A [`ParseError`] always carries enough context to point at the offending
//! character: the source name, the 1-based line and column, the byte offset
//! and the text of the line it sits on. Its `Display` is the one-line
//! `name:line:col: error: message` form; [`ParseError::render_diagnostic`]
//! adds the source line and a caret underneath.

use std::fmt;
use thiserror::Error;

use crate::scanner::Position;

/// Result type alias for xmq parse operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// The closed set of things that can go wrong while reading xmq.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ParseErrorKind {
    #[error("cannot read file")]
    CannotReadFile,

    #[error("out of memory")]
    OutOfMemory,

    /// The buffer looks like XML, HTML or JSON.
    #[error("input file is not xmq")]
    NotXmq,

    #[error("quote is not closed")]
    QuoteNotClosed,

    #[error("entity is not closed")]
    EntityNotClosed,

    #[error("comment is not closed")]
    CommentNotClosed,

    #[error("comment closed with too many slashes")]
    CommentClosedWithTooManySlashes,

    #[error("body is not closed")]
    BodyNotClosed,

    #[error("attributes are not closed")]
    AttributesNotClosed,

    #[error("quote closed with too many quotes")]
    QuoteClosedWithTooManyQuotes,

    #[error("unexpected closing brace")]
    UnexpectedClosingBrace,

    #[error("expected content after equals")]
    ExpectedContentAfterEquals,

    #[error("unexpected tab character (remember tabs must be quoted)")]
    UnexpectedTab,

    #[error("unexpected character")]
    InvalidChar,

    #[error("value cannot start with = or a comment")]
    ValueCannotStartWith,
}

impl ParseErrorKind {
    /// Resource failures happen before any text is looked at, so they carry
    /// no line or column.
    pub fn is_resource(self) -> bool {
        matches!(self, Self::CannotReadFile | Self::OutOfMemory)
    }
}

/// A parse failure with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source_name: String,
    /// 1-based line, 0 for resource errors.
    pub line: usize,
    /// 1-based column counted in characters, 0 for resource errors.
    pub col: usize,
    /// Byte offset into the source buffer.
    pub offset: usize,
    /// The full text of the line holding the error, without its newline.
    pub line_text: String,
    /// The character that triggered an `InvalidChar` error.
    pub offending: Option<char>,
}

impl ParseError {
    /// Build an error located at `pos` inside `source`.
    pub(crate) fn at(
        kind: ParseErrorKind,
        source: &str,
        source_name: &str,
        pos: Position,
    ) -> Self {
        let offset = pos.offset.min(source.len());
        let line_start = memchr::memrchr(b'\n', &source.as_bytes()[..offset]).map_or(0, |i| i + 1);
        let line_end = memchr::memchr(b'\n', &source.as_bytes()[offset..])
            .map_or(source.len(), |i| offset + i);
        let line_text = source[line_start..line_end]
            .trim_end_matches('\r')
            .to_string();
        let offending = match kind {
            ParseErrorKind::InvalidChar => source[offset..].chars().next(),
            _ => None,
        };
        Self {
            kind,
            source_name: source_name.to_string(),
            line: pos.line,
            col: pos.col,
            offset,
            line_text,
            offending,
        }
    }

    /// Build an error that has no position, such as an unreadable file.
    pub(crate) fn resource(kind: ParseErrorKind, source_name: &str) -> Self {
        Self {
            kind,
            source_name: source_name.to_string(),
            line: 0,
            col: 0,
            offset: 0,
            line_text: String::new(),
            offending: None,
        }
    }

    /// Multi-line diagnostic: the one-line form, then the offending source
    /// line and a caret under the column.
    ///
    /// ```text
    /// config.xmq:2:3: error: unexpected character "~" U+7E
    ///   ~b
    ///   ^
    /// ```
    pub fn render_diagnostic(&self) -> String {
        let mut out = self.to_string();
        if self.kind.is_resource() {
            return out;
        }
        out.push('\n');
        out.push_str(&self.line_text);
        out.push('\n');
        out.push_str(&" ".repeat(self.col.saturating_sub(1)));
        out.push('^');
        out
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_resource() {
            return write!(f, "{}: error: {}", self.source_name, self.kind);
        }
        write!(
            f,
            "{}:{}:{}: error: {}",
            self.source_name, self.line, self.col, self.kind
        )?;
        if let Some(c) = self.offending {
            write!(f, " \"{}\" U+{:X}", c, c as u32)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Errors from converting between the tree and XML text.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag { expected: String, found: String },

    #[error("unexpected end tag </{found}>")]
    UnexpectedEndTag { found: String },

    #[error("unexpected end of XML input, expected </{expected}>")]
    UnexpectedEof { expected: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
