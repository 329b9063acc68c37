/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Recursive-descent tokenizer for xmq.
//!
//! ```text
//! document   := item*
//! item       := whitespace | quote | entity | comment | element
//! element    := name attributes? ( '=' value | '{' document '}' )?
//! attributes := '(' attr* ')'
//! attr       := name ( '=' value )?
//! ```
//!
//! `!DOCTYPE = value` and `?target = value` are elements too, but must be
//! followed by a value.
//!
//! Tokens are pushed to a [`TokenSink`] as they are recognized. The first
//! error stops the scan; there is no recovery.

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::options::DEFAULT_MAX_DEPTH;
use crate::scanner::{
    Position, Scanner, is_attribute_key_start, is_compound_start, is_element_start,
    is_entity_start, is_quote_start, is_safe_value_char, is_text_name_char, is_token_whitespace,
    position_at,
};
use crate::token::{Token, TokenKind, TokenSink};

const DOCTYPE: &str = "!DOCTYPE";

/// Tokenize `source`, pushing each token to `sink`.
pub fn tokenize<S>(source: &str, source_name: &str, sink: &mut S) -> Result<()>
where
    S: TokenSink + ?Sized,
{
    tokenize_with_limit(source, source_name, DEFAULT_MAX_DEPTH, sink)
}

/// Like [`tokenize`], with an explicit limit on `{ }` nesting.
pub fn tokenize_with_limit<S>(
    source: &str,
    source_name: &str,
    max_depth: usize,
    sink: &mut S,
) -> Result<()>
where
    S: TokenSink + ?Sized,
{
    let mut state = ParseState::new(source, source_name, max_depth, sink);
    state.parse_document()?;
    if !state.scanner.is_eof() {
        // The document loop only stops early on a closing brace.
        return Err(state.error_here(ParseErrorKind::UnexpectedClosingBrace));
    }
    Ok(())
}

/// Where a value is being read, which decides the token kinds it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Document,
    ElementValue,
    AttrValue,
}

impl Level {
    fn quote_kind(self) -> TokenKind {
        match self {
            Level::Document => TokenKind::Quote,
            Level::ElementValue => TokenKind::ElementValueQuote,
            Level::AttrValue => TokenKind::AttrValueQuote,
        }
    }

    fn entity_kind(self) -> TokenKind {
        match self {
            Level::Document => TokenKind::Entity,
            Level::ElementValue => TokenKind::ElementValueEntity,
            Level::AttrValue => TokenKind::AttrValueEntity,
        }
    }

    fn text_kind(self) -> TokenKind {
        match self {
            Level::AttrValue => TokenKind::AttrValueText,
            _ => TokenKind::ElementValueText,
        }
    }
}

/// Everything the descent functions share for one tokenize call.
struct ParseState<'a, 's, S: ?Sized> {
    scanner: Scanner<'a>,
    source_name: &'a str,
    sink: &'s mut S,
    /// Attribute tokens are held back until the element name before them
    /// has been classified as a key or a name.
    buffered: Option<Vec<Token>>,
    depth: usize,
    max_depth: usize,
    last_attr_start: Position,
    last_quote_start: Position,
    last_equals_start: Position,
}

impl<'a, 's, S> ParseState<'a, 's, S>
where
    S: TokenSink + ?Sized,
{
    fn new(source: &'a str, source_name: &'a str, max_depth: usize, sink: &'s mut S) -> Self {
        Self {
            scanner: Scanner::new(source),
            source_name,
            sink,
            buffered: None,
            depth: 0,
            max_depth,
            last_attr_start: Position::start(),
            last_quote_start: Position::start(),
            last_equals_start: Position::start(),
        }
    }

    fn error_at(&self, kind: ParseErrorKind, pos: Position) -> ParseError {
        ParseError::at(kind, self.scanner.source(), self.source_name, pos)
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(kind, self.scanner.position())
    }

    fn emit(&mut self, token: Token) {
        match &mut self.buffered {
            Some(buffer) => buffer.push(token),
            None => self.sink.token(&token, self.scanner.source()),
        }
    }

    /// Emit a token running from `start` to the cursor.
    fn emit_from(&mut self, kind: TokenKind, start: Position) {
        let token = Token::new(kind, start, self.scanner.offset());
        self.emit(token);
    }

    fn parse_document(&mut self) -> Result<()> {
        loop {
            if self.scanner.is_eof() {
                return Ok(());
            }
            let c = self.scanner.current_char();
            if is_token_whitespace(c) {
                self.parse_whitespace();
            } else if is_quote_start(c) {
                self.parse_quote(Level::Document)?;
            } else if is_entity_start(c) {
                self.parse_entity(Level::Document)?;
            } else if self.scanner.at_comment_start() {
                self.parse_comment()?;
            } else if is_element_start(c) || self.at_doctype() || self.at_pi() {
                self.parse_element()?;
            } else if c == '}' {
                return Ok(());
            } else {
                return Err(self.unexpected_char(c));
            }
        }
    }

    fn at_doctype(&self) -> bool {
        let rest = self.scanner.rest();
        rest.starts_with(DOCTYPE)
            && rest[DOCTYPE.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == '=' || is_token_whitespace(c))
    }

    fn at_pi(&self) -> bool {
        self.scanner.current_char() == '?' && is_text_name_char(self.scanner.peek(1))
    }

    fn unexpected_char(&self, c: char) -> ParseError {
        if matches!(c, '{' | '(' | '=')
            && let Some(equals) = self.lost_content_equals()
        {
            return self.error_at(ParseErrorKind::ExpectedContentAfterEquals, equals);
        }
        if c == '\t' {
            self.error_here(ParseErrorKind::UnexpectedTab)
        } else {
            self.error_here(ParseErrorKind::InvalidChar)
        }
    }

    /// Detect `alfa =` followed by a line break and `beta = 1`: the value of
    /// alfa swallowed the name beta, and the `=` after it is what failed.
    /// Returns the position of the dangling `=`.
    fn lost_content_equals(&self) -> Option<Position> {
        let source = self.scanner.source();
        let bytes = source.as_bytes();
        let mut i = self.scanner.offset();
        while i > 0 && (bytes[i - 1] == b' ' || is_text_name_char(bytes[i - 1] as char)) {
            i -= 1;
        }
        if i == 0 || bytes[i - 1] != b'\n' {
            return None;
        }
        i -= 1;
        while i > 0 && is_token_whitespace(bytes[i - 1] as char) {
            i -= 1;
        }
        if i > 0 && bytes[i - 1] == b'=' {
            Some(position_at(source, i - 1))
        } else {
            None
        }
    }

    fn parse_whitespace(&mut self) {
        let start = self.scanner.position();
        self.scanner.advance_while(is_token_whitespace);
        self.emit_from(TokenKind::Whitespace, start);
    }

    fn skip_whitespace(&mut self) {
        if is_token_whitespace(self.scanner.current_char()) {
            self.parse_whitespace();
        }
    }

    fn parse_quote(&mut self, level: Level) -> Result<()> {
        let start = self.scanner.position();
        self.last_quote_start = start;
        let q = self.scanner.current_char();
        let depth = self.scanner.count_run(q);
        for _ in 0..depth {
            self.scanner.advance();
        }
        if depth != 2 {
            loop {
                if self.scanner.is_eof() {
                    return Err(self.error_at(
                        ParseErrorKind::QuoteNotClosed,
                        self.last_quote_start,
                    ));
                }
                if self.scanner.current_char() == q {
                    let run = self.scanner.count_run(q);
                    if run > depth {
                        return Err(self.error_here(ParseErrorKind::QuoteClosedWithTooManyQuotes));
                    }
                    for _ in 0..run {
                        self.scanner.advance();
                    }
                    if run == depth {
                        break;
                    }
                } else {
                    self.scanner.advance();
                }
            }
        }
        self.emit_from(level.quote_kind(), start);
        Ok(())
    }

    fn parse_entity(&mut self, level: Level) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.advance();
        let mut needs_semicolon = false;
        let mut len = 0;
        while !self.scanner.is_eof() && is_text_name_char(self.scanner.current_char()) {
            let c = self.scanner.advance();
            if !matches!(c, '0'..='9' | 'a'..='f') {
                needs_semicolon = true;
            }
            len += 1;
        }
        if !self.scanner.advance_if(';') && (needs_semicolon || len == 0) {
            return Err(self.error_at(ParseErrorKind::EntityNotClosed, start));
        }
        self.emit_from(level.entity_kind(), start);
        Ok(())
    }

    fn parse_comment(&mut self) -> Result<()> {
        let start = self.scanner.position();
        let slashes = self.scanner.count_run('/');
        if self.scanner.peek(slashes) != '*' {
            self.scanner.advance_while(|c| c != '\n');
            let stop = self.scanner.offset();
            self.scanner.advance_if('\n');
            let mut token = Token::new(TokenKind::Comment, start, stop);
            token.stop_suffix = self.scanner.offset();
            self.emit(token);
            return Ok(());
        }

        for _ in 0..=slashes {
            self.scanner.advance();
        }
        self.scan_block_comment_body(slashes, start)?;
        self.emit_from(TokenKind::Comment, start);

        while self.scanner.current_char() == '*' && !self.scanner.is_eof() {
            let start = self.scanner.position();
            self.scanner.advance();
            self.scan_block_comment_body(slashes, start)?;
            self.emit_from(TokenKind::CommentContinuation, start);
        }
        Ok(())
    }

    /// Consume up to and including an asterisk followed by exactly
    /// `slashes` slashes.
    fn scan_block_comment_body(&mut self, slashes: usize, start: Position) -> Result<()> {
        loop {
            if self.scanner.is_eof() {
                return Err(self.error_at(ParseErrorKind::CommentNotClosed, start));
            }
            if self.scanner.current_char() != '*' {
                self.scanner.advance();
                continue;
            }
            let run = self.scanner.rest()[1..]
                .bytes()
                .take_while(|&b| b == b'/')
                .count();
            if run > slashes {
                return Err(self.error_here(ParseErrorKind::CommentClosedWithTooManySlashes));
            }
            for _ in 0..=run {
                self.scanner.advance();
            }
            if run == slashes {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<()> {
        let start = self.scanner.position();
        let name_start = self.scanner.offset();
        let special = if self.scanner.current_char() == '!' {
            for _ in 0..DOCTYPE.len() {
                self.scanner.advance();
            }
            true
        } else if self.scanner.current_char() == '?' {
            self.scanner.advance();
            self.scanner.advance_while(is_text_name_char);
            true
        } else {
            self.scanner.advance_while(is_text_name_char);
            false
        };
        let name_stop = self.scanner.offset();

        let mut attributes = Vec::new();
        if !special && self.scanner.peek_past_whitespace() == '(' {
            self.buffered = Some(Vec::new());
            let result = self.parse_attributes();
            attributes = self.buffered.take().unwrap_or_default();
            result?;
        }

        let is_key = self.scanner.peek_past_whitespace() == '=';
        self.emit_element_name(start, name_start, name_stop, is_key, special);
        for token in attributes {
            self.emit(token);
        }

        if special && !is_key {
            return Err(self.error_at(ParseErrorKind::InvalidChar, start));
        }

        if is_key {
            self.skip_whitespace();
            self.last_equals_start = self.scanner.position();
            let equals = self.scanner.position();
            self.scanner.advance();
            self.emit_from(TokenKind::Equals, equals);
            self.parse_value(Level::ElementValue)?;
        } else if self.scanner.peek_past_whitespace() == '{' {
            self.skip_whitespace();
            self.parse_body()?;
        }
        Ok(())
    }

    /// Emit the name, split at its last colon into a namespace prefix and a
    /// local name.
    fn emit_element_name(
        &mut self,
        start: Position,
        name_start: usize,
        name_stop: usize,
        is_key: bool,
        special: bool,
    ) {
        let kind = if is_key {
            TokenKind::ElementKey
        } else {
            TokenKind::ElementName
        };
        let name = self.scanner.slice(name_start, name_stop);
        match name.rfind(':').filter(|_| !special) {
            Some(colon) => {
                let colon_offset = name_start + colon;
                self.emit(Token::new(TokenKind::ElementNs, start, colon_offset));
                let colon_pos = Position {
                    offset: colon_offset,
                    line: start.line,
                    col: start.col + colon,
                };
                self.emit(Token::new(TokenKind::Colon, colon_pos, colon_offset + 1));
                let local_pos = Position {
                    offset: colon_offset + 1,
                    line: start.line,
                    col: colon_pos.col + 1,
                };
                self.emit(Token::new(kind, local_pos, name_stop));
            }
            None => self.emit(Token::new(kind, start, name_stop)),
        }
    }

    fn parse_attributes(&mut self) -> Result<()> {
        self.skip_whitespace();
        let start = self.scanner.position();
        self.last_attr_start = start;
        self.scanner.advance();
        self.emit_from(TokenKind::AparLeft, start);

        loop {
            if self.scanner.is_eof() {
                return Err(self.error_at(
                    ParseErrorKind::AttributesNotClosed,
                    self.last_attr_start,
                ));
            }
            let c = self.scanner.current_char();
            if is_token_whitespace(c) {
                self.parse_whitespace();
            } else if c == ')' {
                let close = self.scanner.position();
                self.scanner.advance();
                self.emit_from(TokenKind::AparRight, close);
                return Ok(());
            } else if c == '\t' {
                return Err(self.error_here(ParseErrorKind::UnexpectedTab));
            } else if is_attribute_key_start(c) {
                self.parse_attribute()?;
            } else {
                return Err(self.error_at(
                    ParseErrorKind::AttributesNotClosed,
                    self.last_attr_start,
                ));
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<()> {
        let start = self.scanner.position();
        let name_start = self.scanner.offset();
        self.scanner.advance_while(is_text_name_char);
        let name_stop = self.scanner.offset();
        if name_stop == name_start {
            return Err(self.error_at(ParseErrorKind::AttributesNotClosed, self.last_attr_start));
        }

        let name = self.scanner.slice(name_start, name_stop);
        match name.rfind(':') {
            None => {
                let kind = if name == "xmlns" {
                    TokenKind::NsDeclaration
                } else {
                    TokenKind::AttrKey
                };
                self.emit(Token::new(kind, start, name_stop));
            }
            Some(colon) => {
                let (prefix_kind, local_kind) = if &name[..colon] == "xmlns" {
                    (TokenKind::NsDeclaration, TokenKind::AttrNs)
                } else {
                    (TokenKind::AttrNs, TokenKind::AttrKey)
                };
                let colon_offset = name_start + colon;
                self.emit(Token::new(prefix_kind, start, colon_offset));
                let colon_pos = Position {
                    offset: colon_offset,
                    line: start.line,
                    col: start.col + colon,
                };
                self.emit(Token::new(TokenKind::NsColon, colon_pos, colon_offset + 1));
                let local_pos = Position {
                    offset: colon_offset + 1,
                    line: start.line,
                    col: colon_pos.col + 1,
                };
                self.emit(Token::new(local_kind, local_pos, name_stop));
            }
        }

        if self.scanner.peek_past_whitespace() == '=' {
            self.skip_whitespace();
            let equals = self.scanner.position();
            self.last_equals_start = equals;
            self.scanner.advance();
            self.emit_from(TokenKind::Equals, equals);
            self.parse_value(Level::AttrValue)?;
        }
        Ok(())
    }

    fn parse_value(&mut self, level: Level) -> Result<()> {
        self.skip_whitespace();
        if self.scanner.is_eof() {
            return Err(self.error_at(
                ParseErrorKind::ExpectedContentAfterEquals,
                self.last_equals_start,
            ));
        }
        let c = self.scanner.current_char();
        if is_quote_start(c) {
            self.parse_quote(level)
        } else if is_entity_start(c) {
            self.parse_entity(level)
        } else if c == '\t' {
            Err(self.error_here(ParseErrorKind::UnexpectedTab))
        } else if is_compound_start(c) || matches!(c, '{' | '}' | ')') {
            Err(self.error_at(ParseErrorKind::ExpectedContentAfterEquals, self.last_equals_start))
        } else if c == '=' || self.scanner.at_comment_start() {
            Err(self.error_here(ParseErrorKind::ValueCannotStartWith))
        } else {
            let start = self.scanner.position();
            if self.scanner.advance_while(is_safe_value_char) == 0 {
                return Err(self.error_at(
                    ParseErrorKind::ExpectedContentAfterEquals,
                    self.last_equals_start,
                ));
            }
            self.emit_from(level.text_kind(), start);
            Ok(())
        }
    }

    fn parse_body(&mut self) -> Result<()> {
        let start = self.scanner.position();
        if self.depth >= self.max_depth {
            return Err(self.error_at(ParseErrorKind::BodyNotClosed, start));
        }
        self.scanner.advance();
        self.emit_from(TokenKind::BraceLeft, start);

        self.depth += 1;
        self.parse_document()?;
        self.depth -= 1;

        if self.scanner.is_eof() {
            return Err(self.error_at(ParseErrorKind::BodyNotClosed, start));
        }
        let close = self.scanner.position();
        self.scanner.advance();
        self.emit_from(TokenKind::BraceRight, close);
        Ok(())
    }
}
