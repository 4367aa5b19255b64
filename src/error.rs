//! Diagnostic reporting.
//!
//! `spec.md` §7 separates three error channels (lexical, syntactic, runtime)
//! but requires one shared sink so the driver can latch `had_error` /
//! `had_runtime_error` and pick an exit code (§6). [`ErrorReporter`] is that
//! sink: the scanner and parser are handed a `&mut ErrorReporter` for the
//! duration of a phase rather than storing one, which keeps
//! [`crate::lexer::Scanner`]/[`crate::parser::Parser`] free of reporter
//! lifetimes.
//!
//! Kept in the teacher's own idiom (a plain struct with a hand-written
//! `Display` impl, no `thiserror`) rather than reaching for `ariadne`: §6
//! mandates exact one-line diagnostic strings that a boxed source-snippet
//! renderer can't produce.

use std::fmt;

use crate::token::{Token, TokenKind};

/// A runtime error, carrying the offending token's line for reporting.
///
/// Unwinds the whole statement stack back to the top-level `interpret`
/// call (see [`crate::interpreter::Interpreter::interpret`]).
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
    pub line: usize,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, token: &Token) -> Self {
        RuntimeError {
            message: message.into(),
            line: token.line,
        }
    }

    pub fn at_line(message: impl Into<String>, line: usize) -> Self {
        RuntimeError {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime Error: {} [line {}]", self.message, self.line)
    }
}

/// A sentinel thrown to unwind the current `declaration` for panic-mode
/// recovery (see [`crate::parser::Parser::synchronize`]).
///
/// Carries no data: by the time one is constructed, the offending token and
/// message have already been reported through the [`ErrorReporter`] that
/// was in scope, so there is nothing left for the unwind itself to carry.
#[derive(Debug)]
pub struct ParseError;

/// Accumulates the `had_error` / `had_runtime_error` latches `spec.md` §4.4's
/// REPL state machine and §6's exit-code table both depend on, and formats
/// every diagnostic to stderr in the exact shape §6 specifies.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        ErrorReporter::default()
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears both latches. Called at each REPL line boundary.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Reports a lexical error pinned to a raw line number.
    pub fn error_at_line(&mut self, line: usize, message: &str) {
        eprintln!("[line {}] Error: {}", line, message);
        self.had_error = true;
    }

    /// Reports a syntactic error pinned to a token.
    pub fn error_at_token(&mut self, token: &Token, message: &str) {
        if token.kind == TokenKind::Eof {
            eprintln!("[line {}] Error at end: {}", token.line, message);
        } else {
            eprintln!("[line {}] Error at '{}': {}", token.line, token.lexeme, message);
        }
        self.had_error = true;
    }

    /// Reports a runtime error and latches `had_runtime_error`.
    pub fn runtime_error(&mut self, error: &RuntimeError) {
        eprintln!("{}", error);
        self.had_runtime_error = true;
    }
}
