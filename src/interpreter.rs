//! The tree-walking evaluator.
//!
//! Walks the statement list the parser produced, evaluating expressions and
//! executing statements against a lexically-chained [`EnvironmentArena`].
//! Non-local control flow (`return`, `break`) is modelled as a [`Signal`]
//! returned alongside (not instead of) the error channel, per `spec.md` §9's
//! note that a systems language should use a result sum type here rather than
//! exceptions: `execute` answers `Normal | Break(token) | Return(value)`,
//! and `while`/user-function `call` absorb the signal meant for them.

use std::rc::Rc;
use tracing::instrument;

use crate::ast::{Expr, FunctionDecl, Literal_, Stmt};
use crate::callable::{Function, NativeClock};
use crate::environment::{EnvId, EnvironmentArena};
use crate::error::{ErrorReporter, RuntimeError};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// What a statement did, beyond evaluating for effect.
///
/// `Break` carries the `break` token so an escaping one can still be
/// reported at its own source line rather than the enclosing call's.
enum Signal {
    Normal,
    Break(Token),
    Return(Value),
}

/// Owns every environment created during one interpreter session and the
/// handle to whichever is currently in scope.
pub struct Interpreter {
    arena: EnvironmentArena,
    globals: EnvId,
    current: EnvId,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Builds a fresh interpreter with `clock` defined in the global scope.
    pub fn new() -> Self {
        let (mut arena, globals) = EnvironmentArena::new();
        arena.define(globals, "clock", Value::Callable(Rc::new(NativeClock)));
        Interpreter { arena, globals, current: globals }
    }

    /// Executes `stmts` in order against the current environment. Stops and
    /// reports at the first runtime error; a program that errors partway
    /// through has already produced whatever output preceded the error.
    #[instrument(skip_all, level = "trace")]
    pub fn interpret(&mut self, stmts: &[Stmt], reporter: &mut ErrorReporter) {
        for stmt in stmts {
            if let Err(err) = self.execute(stmt) {
                reporter.runtime_error(&err);
                return;
            }
        }
    }

    /// Invoked by [`crate::callable::Function::call`]. Binds `args` to
    /// `declaration`'s parameters in a fresh environment parented at the
    /// function's closure (not the caller's environment — that's what makes
    /// it a closure rather than dynamic scoping), then runs the body.
    ///
    /// A `Break` that reaches here without being absorbed by a `while`
    /// inside this same call cannot mean anything — the loop it would
    /// unwind to belongs to a different call frame — so it becomes a
    /// runtime error pinned to the `break` statement itself.
    #[instrument(skip(self, declaration, args), level = "trace")]
    pub fn call_function(
        &mut self,
        declaration: &Rc<FunctionDecl>,
        closure: EnvId,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let env = self.arena.push_scope(Some(closure));
        for (param, arg) in declaration.params.iter().zip(args) {
            self.arena.define(env, param.lexeme.clone(), arg);
        }

        match self.execute_block(&declaration.body, env)? {
            Signal::Return(value) => Ok(value),
            Signal::Break(token) => Err(RuntimeError::new("Can't break outside of a loop.", &token)),
            Signal::Normal => Ok(Value::Nil),
        }
    }

    // ---- statements -----------------------------------------------------

    fn execute(&mut self, stmt: &Stmt) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Signal::Normal)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{}", value.stringify());
                Ok(Signal::Normal)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.arena.define(self.current, name.lexeme.clone(), value);
                Ok(Signal::Normal)
            }
            Stmt::Block(stmts) => {
                let env = self.arena.push_scope(Some(self.current));
                self.execute_block(stmts, env)
            }
            Stmt::If { cond, then_branch, else_branch } => {
                if self.evaluate(cond)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Signal::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.evaluate(cond)?.is_truthy() {
                    match self.execute(body)? {
                        Signal::Normal => {}
                        Signal::Break(_) => break,
                        signal @ Signal::Return(_) => return Ok(signal),
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::Break(keyword) => Ok(Signal::Break(keyword.clone())),
            Stmt::Function(declaration) => {
                let function = Function::new(Rc::clone(declaration), self.current);
                self.arena.define(self.current, declaration.name.lexeme.clone(), Value::Callable(Rc::new(function)));
                Ok(Signal::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Signal::Return(value))
            }
        }
    }

    /// Runs `stmts` with `env` as the current environment, restoring the
    /// previous one on every exit path — normal completion, an escaping
    /// `Signal`, or a runtime error.
    fn execute_block(&mut self, stmts: &[Stmt], env: EnvId) -> Result<Signal, RuntimeError> {
        let previous = self.current;
        self.current = env;

        let mut result = Ok(Signal::Normal);
        for stmt in stmts {
            match self.execute(stmt) {
                Ok(Signal::Normal) => {}
                Ok(signal) => {
                    result = Ok(signal);
                    break;
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        self.current = previous;
        result
    }

    // ---- expressions ------------------------------------------------------

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { op, right } => self.evaluate_unary(op, right),
            Expr::Binary { left, op, right } => self.evaluate_binary(left, op, right),
            Expr::Ternary { cond, then, else_ } => {
                if self.evaluate(cond)?.is_truthy() { self.evaluate(then) } else { self.evaluate(else_) }
            }
            Expr::Variable(name) => self.arena.get(self.current, name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.arena.assign(self.current, name, value.clone())?;
                Ok(value)
            }
            Expr::Call { callee, paren, args } => self.evaluate_call(callee, paren, args),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> Result<Value, RuntimeError> {
        let right = self.evaluate(right)?;
        match op.kind {
            TokenKind::Minus => Ok(Value::Number(-expect_number(&right, op)?)),
            TokenKind::Bang => Ok(Value::Boolean(!right.is_truthy())),
            _ => unreachable!("unary expressions only carry Minus or Bang operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match op.kind {
            TokenKind::Minus | TokenKind::Star | TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual => {
                let (a, b) = numeric_operands(&left, &right, op)?;
                Ok(match op.kind {
                    TokenKind::Minus => Value::Number(a - b),
                    TokenKind::Star => Value::Number(a * b),
                    TokenKind::Greater => Value::Boolean(a > b),
                    TokenKind::GreaterEqual => Value::Boolean(a >= b),
                    TokenKind::Less => Value::Boolean(a < b),
                    TokenKind::LessEqual => Value::Boolean(a <= b),
                    _ => unreachable!(),
                })
            }
            TokenKind::Slash => {
                let (a, b) = numeric_operands(&left, &right, op)?;
                if b == 0.0 {
                    return Err(RuntimeError::new("Division by zero.", op));
                }
                Ok(Value::Number(a / b))
            }
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(Rc::from(format!("{}{}", left.stringify(), right.stringify()))))
                }
                _ => Err(RuntimeError::new("Operands must be two numbers or two strings.", op)),
            },
            TokenKind::BangEqual => Ok(Value::Boolean(left != right)),
            TokenKind::EqualEqual => Ok(Value::Boolean(left == right)),
            TokenKind::Comma => Ok(right),
            _ => unreachable!("binary expressions only carry the arithmetic/comparison/comma operators"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(callee)?;

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.evaluate(arg)?);
        }

        let Value::Callable(callable) = callee else {
            return Err(RuntimeError::new("Can only call functions and classes.", paren));
        };

        if arg_values.len() != callable.arity() {
            return Err(RuntimeError::new(
                format!("Expected {} arguments but got {}.", callable.arity(), arg_values.len()),
                paren,
            ));
        }

        callable.call(self, arg_values)
    }
}

fn literal_value(literal: &Literal_) -> Value {
    match literal {
        Literal_::Number(n) => Value::Number(*n),
        Literal_::Str(s) => Value::String(Rc::from(s.as_str())),
        Literal_::Boolean(b) => Value::Boolean(*b),
        Literal_::Nil => Value::Nil,
    }
}

fn expect_number(value: &Value, op: &Token) -> Result<f64, RuntimeError> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::new("Operand must be a number.", op)),
    }
}

fn numeric_operands(left: &Value, right: &Value, op: &Token) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new("Operands must be numbers.", op)),
    }
}
