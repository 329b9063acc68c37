/*
 * token.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The token stream produced by the lexer.

use std::fmt::Write as _;

use crate::scanner::Position;

/// Every kind of token the lexer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    /// A quote at body level.
    Quote,
    /// An entity at body level.
    Entity,
    Comment,
    /// The `* text */` part following a closed block comment.
    CommentContinuation,
    ElementName,
    ElementKey,
    ElementNs,
    Colon,
    ElementValueText,
    ElementValueQuote,
    ElementValueEntity,
    AttrNs,
    AttrKey,
    NsColon,
    NsDeclaration,
    AttrValueText,
    AttrValueQuote,
    AttrValueEntity,
    AparLeft,
    AparRight,
    BraceLeft,
    BraceRight,
    Equals,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Quote => "quote",
            TokenKind::Entity => "entity",
            TokenKind::Comment => "comment",
            TokenKind::CommentContinuation => "comment_continuation",
            TokenKind::ElementName => "element_name",
            TokenKind::ElementKey => "element_key",
            TokenKind::ElementNs => "element_ns",
            TokenKind::Colon => "colon",
            TokenKind::ElementValueText => "element_value_text",
            TokenKind::ElementValueQuote => "element_value_quote",
            TokenKind::ElementValueEntity => "element_value_entity",
            TokenKind::AttrNs => "attr_ns",
            TokenKind::AttrKey => "attr_key",
            TokenKind::NsColon => "ns_colon",
            TokenKind::NsDeclaration => "ns_declaration",
            TokenKind::AttrValueText => "attr_value_text",
            TokenKind::AttrValueQuote => "attr_value_quote",
            TokenKind::AttrValueEntity => "attr_value_entity",
            TokenKind::AparLeft => "apar_left",
            TokenKind::AparRight => "apar_right",
            TokenKind::BraceLeft => "brace_left",
            TokenKind::BraceRight => "brace_right",
            TokenKind::Equals => "equals",
        }
    }

    /// Kinds that carry a value for the element or attribute before them.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::ElementValueText
                | TokenKind::ElementValueQuote
                | TokenKind::ElementValueEntity
                | TokenKind::AttrValueText
                | TokenKind::AttrValueQuote
                | TokenKind::AttrValueEntity
        )
    }
}

/// A classified span of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: Position,
    /// Byte offset just past the token text.
    pub stop: usize,
    /// Byte offset just past everything the token consumed. Larger than
    /// `stop` only for line comments, which swallow their newline.
    pub stop_suffix: usize,
}

impl Token {
    pub fn new(kind: TokenKind, start: Position, stop: usize) -> Self {
        Self {
            kind,
            start,
            stop,
            stop_suffix: stop,
        }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start.offset..self.stop]
    }

    pub fn line(&self) -> usize {
        self.start.line
    }

    pub fn col(&self) -> usize {
        self.start.col
    }
}

/// Receives tokens in source order.
///
/// Any `FnMut(&Token, &str)` closure is a sink:
///
/// ```rust
/// use xmq::{tokenize, TokenKind};
///
/// let mut keys = Vec::new();
/// tokenize("a = 1 b = 2", "inline", &mut |tok: &xmq::Token, src: &str| {
///     if tok.kind == TokenKind::ElementKey {
///         keys.push(tok.text(src).to_string());
///     }
/// })
/// .unwrap();
/// assert_eq!(keys, ["a", "b"]);
/// ```
pub trait TokenSink {
    fn token(&mut self, token: &Token, source: &str);
}

impl<F> TokenSink for F
where
    F: FnMut(&Token, &str),
{
    fn token(&mut self, token: &Token, source: &str) {
        self(token, source)
    }
}

/// A sink that writes one line per token: `kind line:col "text"`.
#[derive(Debug, Default)]
pub struct TokenDump {
    out: String,
}

impl TokenDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl TokenSink for TokenDump {
    fn token(&mut self, token: &Token, source: &str) {
        let _ = writeln!(
            self.out,
            "{} {}:{} {:?}",
            token.kind.name(),
            token.line(),
            token.col(),
            token.text(source)
        );
    }
}
