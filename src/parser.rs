//! Recursive-descent parser with panic-mode recovery.
//!
//! Turns the scanner's token stream into a list of [`Stmt`] nodes. One
//! token of lookahead throughout; see `spec.md` §4.2 for the grammar this
//! mirrors precedence level for precedence level.
//!
//! # The comma operator vs. argument lists
//!
//! `spec.md`'s grammar defines `arguments → expression ("," expression)*`,
//! but its `expression` production bottoms out through `comma`, which
//! itself consumes `","`-separated operands. Taken literally, a call's
//! first argument would greedily swallow every later one via the comma
//! operator before the `arguments` rule ever saw a separator to split on.
//! Every realistic Lox-family grammar that adds a comma operator resolves
//! this the same way: argument (and parameter) positions bind one level
//! tighter, at `assignment`-without-comma. [`Parser::call_argument`]
//! implements that — it is [`Parser::assignment`]'s logic with its base
//! case swapped from `comma` to `ternary`.

use std::rc::Rc;
use tracing::instrument;

use crate::ast::{Expr, FunctionDecl, Literal_, Stmt};
use crate::error::{ErrorReporter, ParseError};
use crate::token::{Literal, Token, TokenKind};

type ParseResult<T> = Result<T, ParseError>;

const MAX_ARGS: usize = 255;

/// A recursive descent parser for Oxente.
///
/// Tracks a single cursor into the token stream (no backtracking) plus the
/// enclosing-loop depth `break` validation needs.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Number of enclosing `while`/desugared `for` loops, used to flag a
    /// `break` outside any loop. Not reset at function boundaries — see
    /// `SPEC_FULL.md` §9 on `break` escaping a function.
    loop_depth: usize,
}

impl Parser {
    /// # Panics
    /// Panics if `tokens` is empty. The scanner always emits at least `Eof`.
    pub fn new(tokens: Vec<Token>) -> Self {
        assert!(!tokens.is_empty(), "token list must include at least Eof");
        Parser { tokens, pos: 0, loop_depth: 0 }
    }

    /// Parses every declaration in the token stream, recovering from
    /// syntax errors at statement boundaries so one bad statement doesn't
    /// hide errors in the rest of the program.
    #[instrument(skip(self, reporter), level = "trace")]
    pub fn parse(&mut self, reporter: &mut ErrorReporter) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.is_eof() {
            if let Some(stmt) = self.declaration(reporter) {
                stmts.push(stmt);
            }
        }
        stmts
    }

    // ---- token stream plumbing -----------------------------------------

    /// Returns a reference to the current token. Safe to call at any
    /// time: past the end of the stream it returns the trailing `Eof`.
    fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn is_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    /// Consumes and returns the current token. Does nothing past `Eof`.
    fn advance(&mut self) -> Token {
        let current = self.current().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        current
    }

    /// Consumes the current token if it is one of `kinds`.
    fn match_token(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if self.check_any(kinds) { Some(self.advance()) } else { None }
    }

    /// Consumes the current token if it matches `kind`, else reports
    /// `message` at the current token and throws the panic-mode sentinel.
    fn consume(&mut self, kind: TokenKind, message: &str, reporter: &mut ErrorReporter) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.current().clone();
            reporter.error_at_token(&token, message);
            Err(ParseError)
        }
    }

    /// Discards tokens until the previous token was `;` or the next token
    /// begins a new statement, so parsing can resume past a syntax error.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_eof() {
            if self.tokens[self.pos - 1].kind == TokenKind::Semicolon {
                return;
            }
            match self.current().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ---- declarations ---------------------------------------------------

    fn declaration(&mut self, reporter: &mut ErrorReporter) -> Option<Stmt> {
        let result = if self.match_token(&[TokenKind::Fun]).is_some() {
            self.fun_decl(reporter)
        } else if self.match_token(&[TokenKind::Var]).is_some() {
            self.var_decl(reporter)
        } else {
            self.statement(reporter)
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    fn fun_decl(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.", reporter)?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.", reporter)?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    reporter.error_at_token(self.current(), "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.", reporter)?);
                if self.match_token(&[TokenKind::Comma]).is_none() {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.", reporter)?;

        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.", reporter)?;
        let body = self.block_stmts(reporter)?;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn var_decl(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.", reporter)?;
        let initializer = if self.match_token(&[TokenKind::Equal]).is_some() {
            Some(self.expression(reporter)?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.", reporter)?;
        Ok(Stmt::Var { name, initializer })
    }

    // ---- statements -------------------------------------------------------

    fn statement(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        if self.match_token(&[TokenKind::Print]).is_some() {
            return self.print_stmt(reporter);
        }
        if self.match_token(&[TokenKind::If]).is_some() {
            return self.if_stmt(reporter);
        }
        if self.match_token(&[TokenKind::While]).is_some() {
            return self.while_stmt(reporter);
        }
        if self.match_token(&[TokenKind::For]).is_some() {
            return self.for_stmt(reporter);
        }
        if let Some(keyword) = self.match_token(&[TokenKind::Return]) {
            return self.return_stmt(keyword, reporter);
        }
        if let Some(keyword) = self.match_token(&[TokenKind::Break]) {
            return self.break_stmt(keyword, reporter);
        }
        if self.match_token(&[TokenKind::LeftBrace]).is_some() {
            return Ok(Stmt::Block(self.block_stmts(reporter)?));
        }
        self.expr_stmt(reporter)
    }

    /// Parses statements up to (and consuming) the closing `}`. The leading
    /// `{` must already have been consumed by the caller.
    fn block_stmts(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            if let Some(stmt) = self.declaration(reporter) {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.", reporter)?;
        Ok(stmts)
    }

    fn print_stmt(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        let value = self.expression(reporter)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.", reporter)?;
        Ok(Stmt::Print(value))
    }

    fn if_stmt(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.", reporter)?;
        let cond = self.expression(reporter)?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.", reporter)?;

        let then_branch = Box::new(self.statement(reporter)?);
        let else_branch = if self.match_token(&[TokenKind::Else]).is_some() {
            Some(Box::new(self.statement(reporter)?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn while_stmt(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.", reporter)?;
        let cond = self.expression(reporter)?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.", reporter)?;

        self.loop_depth += 1;
        let body = self.statement(reporter);
        self.loop_depth -= 1;

        Ok(Stmt::While { cond, body: Box::new(body?) })
    }

    /// Desugars into `{ initializer; while (cond) { body; increment; } }`,
    /// per `spec.md` §4.2.
    fn for_stmt(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.", reporter)?;

        let initializer = if self.match_token(&[TokenKind::Semicolon]).is_some() {
            None
        } else if self.match_token(&[TokenKind::Var]).is_some() {
            Some(self.var_decl(reporter)?)
        } else {
            Some(self.expr_stmt(reporter)?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression(reporter)?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.", reporter)?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression(reporter)?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.", reporter)?;

        self.loop_depth += 1;
        let body = self.statement(reporter);
        self.loop_depth -= 1;
        let mut body = body?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let cond = condition.unwrap_or(Expr::Literal(Literal_::Boolean(true)));
        body = Stmt::While { cond, body: Box::new(body) };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn return_stmt(&mut self, keyword: Token, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression(reporter)?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.", reporter)?;
        Ok(Stmt::Return { keyword, value })
    }

    /// A `break` outside any loop is reported but does not abort parsing.
    fn break_stmt(&mut self, keyword: Token, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        if self.loop_depth == 0 {
            reporter.error_at_token(&keyword, "Can't break outside of a loop.");
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.", reporter)?;
        Ok(Stmt::Break(keyword))
    }

    fn expr_stmt(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Stmt> {
        let expr = self.expression(reporter)?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.", reporter)?;
        Ok(Stmt::Expression(expr))
    }

    // ---- expressions, lowest precedence first ----------------------------

    fn expression(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        self.assignment(reporter)
    }

    fn assignment(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        let expr = self.comma(reporter)?;
        self.finish_assignment(expr, reporter)
    }

    /// Shared by [`Parser::assignment`] and [`Parser::call_argument`]: if
    /// `=` follows, recurse for the value and convert a `Variable` left side
    /// into an `Assign`; any other left side makes the `=` an error that is
    /// reported but does not throw.
    fn finish_assignment(&mut self, expr: Expr, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        if let Some(equals) = self.match_token(&[TokenKind::Equal]) {
            let value = self.assignment(reporter)?;
            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign { name, value: Box::new(value) });
            }
            reporter.error_at_token(&equals, "Invalid assignment target.");
            return Ok(expr);
        }
        Ok(expr)
    }

    fn comma(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        self.binary_level(reporter, &[TokenKind::Comma], Parser::ternary)
    }

    fn ternary(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        let cond = self.equality(reporter)?;
        if self.match_token(&[TokenKind::Question]).is_some() {
            let then = self.expression(reporter)?;
            self.consume(TokenKind::Colon, "Expect ':' in ternary expression.", reporter)?;
            let else_ = self.ternary(reporter)?;
            return Ok(Expr::Ternary { cond: Box::new(cond), then: Box::new(then), else_: Box::new(else_) });
        }
        Ok(cond)
    }

    fn equality(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        self.binary_level(reporter, &[TokenKind::BangEqual, TokenKind::EqualEqual], Parser::comparison)
    }

    fn comparison(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        self.binary_level(
            reporter,
            &[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual],
            Parser::term,
        )
    }

    fn term(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        self.binary_level(reporter, &[TokenKind::Minus, TokenKind::Plus], Parser::factor)
    }

    fn factor(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        self.binary_level(reporter, &[TokenKind::Slash, TokenKind::Star], Parser::unary)
    }

    /// Parses one left-associative binary precedence level. If the level
    /// begins with one of its own operators (no left operand, e.g. `== 1`),
    /// reports `"Missing left-hand operand."`, consumes exactly one right
    /// operand at `next`'s precedence to avoid cascading errors, and yields
    /// `Literal(nil)` in place of the missing expression.
    fn binary_level(
        &mut self,
        reporter: &mut ErrorReporter,
        ops: &[TokenKind],
        next: fn(&mut Parser, &mut ErrorReporter) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        if self.check_any(ops) {
            let op = self.advance();
            reporter.error_at_token(&op, "Missing left-hand operand.");
            next(self, reporter)?;
            return Ok(Expr::Literal(Literal_::Nil));
        }

        let mut expr = next(self, reporter)?;
        while self.check_any(ops) {
            let op = self.advance();
            let right = next(self, reporter)?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn unary(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        if let Some(op) = self.match_token(&[TokenKind::Bang, TokenKind::Minus]) {
            let right = self.unary(reporter)?;
            return Ok(Expr::Unary { op, right: Box::new(right) });
        }
        self.call(reporter)
    }

    fn call(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        let mut expr = self.primary(reporter)?;
        while self.match_token(&[TokenKind::LeftParen]).is_some() {
            expr = self.finish_call(expr, reporter)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    reporter.error_at_token(self.current(), "Can't have more than 255 arguments.");
                }
                args.push(self.call_argument(reporter)?);
                if self.match_token(&[TokenKind::Comma]).is_none() {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.", reporter)?;
        Ok(Expr::Call { callee: Box::new(callee), paren, args })
    }

    /// An argument (or parameter-position) expression — see the module
    /// docs on why this bottoms out at `ternary` rather than `comma`.
    fn call_argument(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        let expr = self.ternary(reporter)?;
        self.finish_assignment(expr, reporter)
    }

    fn primary(&mut self, reporter: &mut ErrorReporter) -> ParseResult<Expr> {
        if self.match_token(&[TokenKind::False]).is_some() {
            return Ok(Expr::Literal(Literal_::Boolean(false)));
        }
        if self.match_token(&[TokenKind::True]).is_some() {
            return Ok(Expr::Literal(Literal_::Boolean(true)));
        }
        if self.match_token(&[TokenKind::Nil]).is_some() {
            return Ok(Expr::Literal(Literal_::Nil));
        }
        if self.check(TokenKind::Number) {
            let token = self.advance();
            let Some(Literal::Number(n)) = token.literal else {
                unreachable!("NUMBER token must carry a Literal::Number");
            };
            return Ok(Expr::Literal(Literal_::Number(n)));
        }
        if self.check(TokenKind::String) {
            let token = self.advance();
            let Some(Literal::Str(s)) = token.literal else {
                unreachable!("STRING token must carry a Literal::Str");
            };
            return Ok(Expr::Literal(Literal_::Str(s)));
        }
        if self.check(TokenKind::Identifier) {
            return Ok(Expr::Variable(self.advance()));
        }
        if self.match_token(&[TokenKind::LeftParen]).is_some() {
            let expr = self.expression(reporter)?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.", reporter)?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        let token = self.current().clone();
        reporter.error_at_token(&token, "Expect expression.");
        Err(ParseError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::lexer::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, ErrorReporter) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let stmts = Parser::new(tokens).parse(&mut reporter);
        (stmts, reporter)
    }

    #[test]
    fn empty_program_parses_to_no_statements() {
        let (stmts, reporter) = parse("");
        assert!(stmts.is_empty());
        assert!(!reporter.had_error());
    }

    #[test]
    fn call_with_multiple_arguments_does_not_merge_via_comma_operator() {
        let (stmts, reporter) = parse("f(1, 2, 3);");
        assert!(!reporter.had_error());
        let Stmt::Expression(Expr::Call { args, .. }) = &stmts[0] else {
            panic!("expected a call expression statement");
        };
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn leading_binary_operator_reports_missing_operand_and_recovers() {
        let (stmts, reporter) = parse("== 1;");
        assert!(reporter.had_error());
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Stmt::Expression(Expr::Literal(Literal_::Nil))));
    }

    #[test]
    fn invalid_assignment_target_is_reported_but_not_fatal() {
        let (stmts, reporter) = parse("1 = 2;");
        assert!(reporter.had_error());
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn break_outside_loop_is_reported_but_parsing_continues() {
        let (stmts, reporter) = parse("break; print 1;");
        assert!(reporter.had_error());
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn for_loop_desugars_to_block_containing_while() {
        let (stmts, reporter) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!reporter.had_error());
        let Stmt::Block(outer) = &stmts[0] else { panic!("expected desugared block") };
        assert!(matches!(outer[0], Stmt::Var { .. }));
        assert!(matches!(outer[1], Stmt::While { .. }));
    }

    #[test]
    fn panic_mode_recovers_at_next_statement() {
        let (stmts, reporter) = parse("var ; print 1;");
        assert!(reporter.had_error());
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Stmt::Print(_)));
    }
}
