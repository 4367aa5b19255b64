//! Scanner: turns source text into a token stream.
//!
//! Operates on a moving window `[start, current)` over the source, per
//! `spec.md` §4.1: each iteration of [`Scanner::scan_tokens`] sets
//! `start = current` and scans exactly one token. Lexical errors are
//! reported through the caller's [`ErrorReporter`] and scanning continues —
//! a single bad character never aborts the whole phase.

use tracing::instrument;

use crate::error::ErrorReporter;
use crate::token::{Literal, Token, TokenKind, keyword_kind};

pub struct Scanner<'a> {
    source: &'a str,
    /// Byte offset where the token currently being scanned begins.
    start: usize,
    /// Byte offset of the next unconsumed character.
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scans the entire source, returning every token including a final
    /// `Eof`. Errors are reported as encountered; scanning never stops
    /// early because of one.
    #[instrument(skip(self, reporter), level = "trace")]
    pub fn scan_tokens(&mut self, reporter: &mut ErrorReporter) -> Vec<Token> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.start = self.current;
            if let Some(token) = self.scan_token(reporter) {
                tokens.push(token);
            }
        }

        tokens.push(Token::new(TokenKind::Eof, "", None, self.line));
        tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current..].chars().next().expect("advance past end");
        self.current += c.len_utf8();
        c
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    /// Consumes the current character if it equals `expected` (maximal
    /// munch for the two-character operators).
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn make(&self, kind: TokenKind) -> Option<Token> {
        Some(Token::new(kind, self.lexeme(), None, self.line))
    }

    fn make_literal(&self, kind: TokenKind, literal: Literal) -> Option<Token> {
        Some(Token::new(kind, self.lexeme(), Some(literal), self.line))
    }

    /// Scans one token starting at `self.start`, or returns `None` if the
    /// "token" was actually whitespace, a comment, or a reported error with
    /// nothing to emit.
    fn scan_token(&mut self, reporter: &mut ErrorReporter) -> Option<Token> {
        let c = self.advance();

        match c {
            '(' => self.make(TokenKind::LeftParen),
            ')' => self.make(TokenKind::RightParen),
            '{' => self.make(TokenKind::LeftBrace),
            '}' => self.make(TokenKind::RightBrace),
            ',' => self.make(TokenKind::Comma),
            '.' => self.make(TokenKind::Dot),
            '-' => self.make(TokenKind::Minus),
            '+' => self.make(TokenKind::Plus),
            ';' => self.make(TokenKind::Semicolon),
            '*' => self.make(TokenKind::Star),
            '?' => self.make(TokenKind::Question),
            ':' => self.make(TokenKind::Colon),

            '!' => {
                let kind = if self.match_char('=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.make(kind)
            }
            '=' => {
                let kind = if self.match_char('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.make(kind)
            }
            '<' => {
                let kind = if self.match_char('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.make(kind)
            }
            '>' => {
                let kind = if self.match_char('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.make(kind)
            }

            '/' => self.scan_slash(reporter),

            ' ' | '\t' | '\r' => None,
            '\n' => {
                self.line += 1;
                None
            }

            '"' => self.scan_string(reporter),

            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(),

            other => {
                reporter.error_at_line(self.line, "Unexpected character.");
                let _ = other;
                None
            }
        }
    }

    /// Disambiguates `/` as a line comment, a block comment, or the
    /// `SLASH` token.
    fn scan_slash(&mut self, reporter: &mut ErrorReporter) -> Option<Token> {
        if self.match_char('/') {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
            None
        } else if self.match_char('*') {
            self.scan_block_comment(reporter);
            None
        } else {
            self.make(TokenKind::Slash)
        }
    }

    /// Block comments do not nest; an unterminated one is an error pinned
    /// to the line where the comment opened.
    fn scan_block_comment(&mut self, reporter: &mut ErrorReporter) {
        let start_line = self.line;
        loop {
            match self.peek() {
                None => {
                    reporter.error_at_line(start_line, "Unterminated block comment.");
                    return;
                }
                Some('\n') => {
                    self.line += 1;
                    self.advance();
                }
                Some('*') if self.peek_next() == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// A string literal may span multiple lines; no escape processing.
    fn scan_string(&mut self, reporter: &mut ErrorReporter) -> Option<Token> {
        let start_line = self.line;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.peek().is_none() {
            reporter.error_at_line(start_line, "Unterminated string.");
            return None;
        }

        // The content is everything between the quotes.
        let value = self.source[self.start + 1..self.current].to_string();
        self.advance(); // closing '"'
        self.make_literal(TokenKind::String, Literal::Str(value))
    }

    /// One or more digits, optionally followed by `.` and one or more
    /// digits. A trailing `.` with no fractional digits is not consumed
    /// (so `3.` scans as `3` then `.`).
    fn scan_number(&mut self) -> Option<Token> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // the '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.lexeme();
        let value: f64 = text.parse().expect("scanned number lexeme must parse");
        self.make_literal(TokenKind::Number, Literal::Number(value))
    }

    /// Identifiers start with a letter or `_`, then continue with letters,
    /// digits, or `_`. Keywords are identifiers whose text is reserved.
    fn scan_identifier(&mut self) -> Option<Token> {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let text = self.lexeme();
        let kind = keyword_kind(text).unwrap_or(TokenKind::Identifier);
        self.make(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, ErrorReporter) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        (tokens, reporter)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn ends_with_eof() {
        let (tokens, reporter) = scan("");
        assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
        assert!(!reporter.had_error());
    }

    #[test]
    fn single_and_two_char_operators() {
        let (tokens, _) = scan("! != = == < <= > >=");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped_block_comment_does_not_nest() {
        let (tokens, reporter) = scan("1 // comment\n2 /* a /* b */ 3");
        // the block comment ends at the first `*/`, so `3` remains a token.
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
        assert!(!reporter.had_error());
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (tokens, reporter) = scan("\"abc");
        assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
        assert!(reporter.had_error());
    }

    #[test]
    fn string_literal_may_span_lines() {
        let (tokens, _) = scan("\"a\nb\"");
        match &tokens[0].literal {
            Some(Literal::Str(s)) => assert_eq!(s, "a\nb"),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn number_literal_trailing_dot_not_consumed() {
        let (tokens, _) = scan("3.");
        assert_eq!(kinds(&tokens), vec![TokenKind::Number, TokenKind::Dot, TokenKind::Eof]);
    }

    #[test]
    fn identifier_vs_keyword() {
        let (tokens, _) = scan("foo fun and");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Identifier, TokenKind::Fun, TokenKind::And, TokenKind::Eof]
        );
    }

    #[test]
    fn unexpected_character_reports_and_continues() {
        let (tokens, reporter) = scan("1 @ 2");
        assert!(reporter.had_error());
        assert_eq!(kinds(&tokens), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
    }
}
