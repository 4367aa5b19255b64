//! The callable protocol and its two implementers.
//!
//! A value is callable iff it answers `arity()` and `call()` (`spec.md`
//! §4.5). The native `clock` and user-defined [`Function`] both implement
//! [`Callable`]; [`crate::value::Value::Callable`] stores either behind one
//! `Rc<dyn Callable>` so the interpreter's `Call` handling never needs to
//! distinguish them.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::FunctionDecl;
use crate::environment::EnvId;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Uniform call interface shared by native and user-defined functions.
pub trait Callable {
    /// The fixed number of arguments this callable accepts.
    fn arity(&self) -> usize;

    /// Invokes the callable with already-evaluated arguments.
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError>;

    /// How this callable stringifies (`<native fn>` or `<fn NAME>`).
    fn describe(&self) -> String;
}

/// The single native function: `clock() -> Number`, seconds since an
/// arbitrary epoch. Its actual time source is an external collaborator
/// (`spec.md` §1) — only the shape of the value it returns is specified.
pub struct NativeClock;

impl Callable for NativeClock {
    fn arity(&self) -> usize {
        0
    }

    fn call(&self, _interpreter: &mut Interpreter, _args: Vec<Value>) -> Result<Value, RuntimeError> {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Ok(Value::Number(seconds))
    }

    fn describe(&self) -> String {
        "<native fn>".to_string()
    }
}

/// A user-defined function value: its declaration plus the environment
/// handle captured at the point `fun` was executed — its closure.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvId,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvId) -> Self {
        Function { declaration, closure }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        interpreter.call_function(&self.declaration, self.closure, args)
    }

    fn describe(&self) -> String {
        format!("<fn {}>", self.declaration.name.lexeme)
    }
}
