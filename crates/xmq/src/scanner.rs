/*
 * scanner.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Character cursor over an immutable source buffer.
//!
//! The cursor only ever moves forward one character at a time, which keeps
//! the byte offset, line and column in step with each other.

/// A location in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Byte offset from the start of the buffer.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub col: usize,
}

impl Position {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            col: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

/// Line and column of a byte offset, computed from scratch. Used where the
/// cursor has already moved past the location being reported.
pub fn position_at(source: &str, offset: usize) -> Position {
    let before = &source.as_bytes()[..offset.min(source.len())];
    let line = memchr::memchr_iter(b'\n', before).count() + 1;
    let line_start = memchr::memrchr(b'\n', before).map_or(0, |i| i + 1);
    let col = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
    Position {
        offset: before.len(),
        line,
        col,
    }
}

/// Returned by [`Scanner::current_char`] once the buffer is exhausted.
pub const EOF_CHAR: char = '\0';

#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    pos: Position,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: Position::start(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn offset(&self) -> usize {
        self.pos.offset
    }

    pub fn is_eof(&self) -> bool {
        self.pos.offset >= self.source.len()
    }

    /// Text from the cursor to the end of the buffer.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos.offset..]
    }

    pub fn current_char(&self) -> char {
        self.rest().chars().next().unwrap_or(EOF_CHAR)
    }

    /// Look `k` characters ahead without moving; `peek(0)` is the current char.
    pub fn peek(&self, k: usize) -> char {
        self.rest().chars().nth(k).unwrap_or(EOF_CHAR)
    }

    /// Consume one character and return it.
    pub fn advance(&mut self) -> char {
        let Some(c) = self.rest().chars().next() else {
            return EOF_CHAR;
        };
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.col = 1;
        } else {
            self.pos.col += 1;
        }
        c
    }

    /// Consume the current character only if it is `expected`.
    pub fn advance_if(&mut self, expected: char) -> bool {
        if !self.is_eof() && self.current_char() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds; returns how many were consumed.
    pub fn advance_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut n = 0;
        while !self.is_eof() && pred(self.current_char()) {
            self.advance();
            n += 1;
        }
        n
    }

    /// Count consecutive occurrences of `c` at the cursor without consuming.
    pub fn count_run(&self, c: char) -> usize {
        self.rest().chars().take_while(|&x| x == c).count()
    }

    /// True when the cursor sits on `//` or `/*`.
    pub fn at_comment_start(&self) -> bool {
        self.current_char() == '/' && matches!(self.peek(1), '/' | '*')
    }

    /// The first character after any token whitespace, without consuming.
    pub fn peek_past_whitespace(&self) -> char {
        self.rest()
            .chars()
            .find(|&c| !is_token_whitespace(c))
            .unwrap_or(EOF_CHAR)
    }

    pub fn slice(&self, start: usize, stop: usize) -> &'a str {
        &self.source[start..stop]
    }
}

/// Separating whitespace between tokens. Tab is not whitespace here.
pub fn is_token_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\r')
}

/// No-break space and the wide spaces U+2000..=U+2003.
pub fn is_unicode_whitespace(c: char) -> bool {
    matches!(c, '\u{A0}' | '\u{2000}'..='\u{2003}')
}

pub fn is_text_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '#')
}

pub fn is_element_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_quote_start(c: char) -> bool {
    matches!(c, '\'' | '"')
}

pub fn is_entity_start(c: char) -> bool {
    c == '&'
}

pub fn is_compound_start(c: char) -> bool {
    c == '('
}

pub fn is_attribute_key_start(c: char) -> bool {
    !matches!(
        c,
        '\'' | '"' | '(' | ')' | '{' | '}' | '/' | '=' | '&' | EOF_CHAR
    ) && !is_token_whitespace(c)
        && c != '\t'
}

/// A character that may appear in an unquoted value.
pub fn is_safe_value_char(c: char) -> bool {
    !is_token_whitespace(c)
        && !is_unicode_whitespace(c)
        && !matches!(c, '\t' | '(' | ')' | '{' | '}' | '\'' | '"' | EOF_CHAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines_and_columns() {
        let mut s = Scanner::new("ab\ncd");
        s.advance();
        s.advance();
        assert_eq!(s.position(), Position { offset: 2, line: 1, col: 3 });
        assert_eq!(s.advance(), '\n');
        assert_eq!(s.position(), Position { offset: 3, line: 2, col: 1 });
    }

    #[test]
    fn test_column_counts_characters_not_bytes() {
        let mut s = Scanner::new("åäö=");
        s.advance_while(|c| c != '=');
        assert_eq!(s.position().col, 4);
        assert_eq!(s.offset(), 6);
        assert_eq!(s.current_char(), '=');
    }

    #[test]
    fn test_position_at_matches_cursor() {
        let src = "a\nbé = 1";
        let mut s = Scanner::new(src);
        s.advance_while(|c| c != '=');
        assert_eq!(position_at(src, s.offset()), s.position());
    }

    #[test]
    fn test_eof_sentinel() {
        let mut s = Scanner::new("x");
        assert_eq!(s.peek(1), EOF_CHAR);
        s.advance();
        assert!(s.is_eof());
        assert_eq!(s.current_char(), EOF_CHAR);
        assert_eq!(s.advance(), EOF_CHAR);
        assert_eq!(s.offset(), 1);
    }

    #[test]
    fn test_classifiers() {
        assert!(!is_token_whitespace('\t'));
        assert!(is_unicode_whitespace('\u{2002}'));
        assert!(!is_unicode_whitespace('\u{2004}'));
        assert!(is_text_name_char('#'));
        assert!(!is_element_start('1'));
        assert!(is_safe_value_char('='));
        assert!(!is_safe_value_char('\u{A0}'));
        assert!(!is_attribute_key_start('&'));
        assert!(is_attribute_key_start('x'));
    }

    #[test]
    fn test_comment_start_and_peek_past_whitespace() {
        let s = Scanner::new("/* x */");
        assert!(s.at_comment_start());
        assert!(!Scanner::new("/x").at_comment_start());
        assert_eq!(Scanner::new(" \n\r = 1").peek_past_whitespace(), '=');
        assert_eq!(Scanner::new("  ").peek_past_whitespace(), EOF_CHAR);
    }
}
