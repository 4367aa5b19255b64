//! Lexically-chained environments.
//!
//! `spec.md` §9 calls for environments to live in an arena owned by the
//! interpreter and be referred to by stable integer handles, rather than by
//! the shared-mutable-reference graph a garbage-collected host would use
//! (a `Function` closing over its environment, which in turn can hold that
//! same `Function` under its own name, is a reference cycle — fine for a
//! tracing collector, a leak for `Rc`). The arena only grows; it is dropped
//! as a whole when the owning [`crate::interpreter::Interpreter`] is.

use std::collections::HashMap;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// A stable handle to a [`Scope`] inside an [`EnvironmentArena`].
///
/// `EnvId` values are only ever compared for equality and used to index the
/// arena; they are never dereferenced directly, so a `Function` can hold one
/// past the lifetime of the block that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(usize);

struct Scope {
    parent: Option<EnvId>,
    bindings: HashMap<String, Value>,
}

/// The arena owning every [`Scope`] created during an interpreter session.
pub struct EnvironmentArena {
    scopes: Vec<Scope>,
}

impl EnvironmentArena {
    /// Creates the arena with a single root scope (the global environment)
    /// and returns its handle.
    pub fn new() -> (Self, EnvId) {
        let mut arena = EnvironmentArena { scopes: Vec::new() };
        let global = arena.push_scope(None);
        (arena, global)
    }

    /// Allocates a fresh scope whose parent is `parent` (`None` only ever
    /// applies to the global scope created by [`EnvironmentArena::new`]).
    pub fn push_scope(&mut self, parent: Option<EnvId>) -> EnvId {
        let id = EnvId(self.scopes.len());
        self.scopes.push(Scope {
            parent,
            bindings: HashMap::new(),
        });
        id
    }

    /// Defines (or redefines — redefinition is permitted) `name` in `env`'s
    /// own scope. Never touches a parent scope.
    pub fn define(&mut self, env: EnvId, name: impl Into<String>, value: Value) {
        self.scopes[env.0].bindings.insert(name.into(), value);
    }

    /// Looks up `name_token.lexeme`, searching `env` then its ancestors.
    pub fn get(&self, env: EnvId, name_token: &Token) -> Result<Value, RuntimeError> {
        let mut cursor = Some(env);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.0];
            if let Some(value) = scope.bindings.get(&name_token.lexeme) {
                return Ok(value.clone());
            }
            cursor = scope.parent;
        }
        Err(RuntimeError::new(
            format!("Undefined variable '{}'.", name_token.lexeme),
            name_token,
        ))
    }

    /// Mutates the nearest existing binding for `name_token.lexeme`, walking
    /// outward from `env`. Never creates a new binding.
    pub fn assign(&mut self, env: EnvId, name_token: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut cursor = Some(env);
        while let Some(id) = cursor {
            let scope = &mut self.scopes[id.0];
            if scope.bindings.contains_key(&name_token.lexeme) {
                scope.bindings.insert(name_token.lexeme.clone(), value);
                return Ok(());
            }
            cursor = scope.parent;
        }
        Err(RuntimeError::new(
            format!("Undefined variable '{}'.", name_token.lexeme),
            name_token,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn name(text: &str) -> Token {
        Token::new(TokenKind::Identifier, text, None, 1)
    }

    #[test]
    fn child_shadows_without_mutating_parent() {
        let (mut arena, global) = EnvironmentArena::new();
        arena.define(global, "a", Value::Number(1.0));
        let child = arena.push_scope(Some(global));
        arena.define(child, "a", Value::Number(2.0));

        assert_eq!(arena.get(child, &name("a")).unwrap(), Value::Number(2.0));
        assert_eq!(arena.get(global, &name("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_walks_outward_to_the_defining_scope() {
        let (mut arena, global) = EnvironmentArena::new();
        arena.define(global, "a", Value::Number(1.0));
        let child = arena.push_scope(Some(global));

        arena.assign(child, &name("a"), Value::Number(9.0)).unwrap();
        assert_eq!(arena.get(global, &name("a")).unwrap(), Value::Number(9.0));
    }

    #[test]
    fn assign_to_undefined_name_errors() {
        let (mut arena, global) = EnvironmentArena::new();
        assert!(arena.assign(global, &name("missing"), Value::Nil).is_err());
    }

    #[test]
    fn get_undefined_name_errors() {
        let (arena, global) = EnvironmentArena::new();
        assert!(arena.get(global, &name("missing")).is_err());
    }
}
