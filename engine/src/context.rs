//! The identifier→value map. Callers own the map; the evaluator mutates
//! it only through the `++`/`--` operators.

use std::collections::HashMap;

use crate::error::{ErrorCode, RuntimeError};
use crate::value::Value;

/// A mutable mapping from identifier to [`Value`], passed by the caller
/// into [`crate::evaluate`] and potentially mutated by `++`/`--`.
#[derive(Debug, Clone, Default)]
pub struct Context {
    bindings: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Context { bindings: HashMap::new() }
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::with_stmt(ErrorCode::VarUndef, name))
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// `++v`: mutates the binding in place and returns the post-mutation
    /// value. An undefined target is E_INV_IDENTIF (the original treats the
    /// operand of `++`/`--` as an identifier reference, not a variable
    /// lookup, so an unbound name is an invalid identifier rather than
    /// E_VAR_UNDEF). Vector or non-numeric bindings are E_TYPE_ILLEGAL.
    pub fn increment(&mut self, name: &str) -> Result<Value, RuntimeError> {
        if !self.is_defined(name) {
            return Err(RuntimeError::with_stmt(ErrorCode::InvIdentif, name));
        }
        let next = self.get(name)?.increment()?;
        self.bindings.insert(name.to_string(), next.clone());
        Ok(next)
    }

    pub fn decrement(&mut self, name: &str) -> Result<Value, RuntimeError> {
        if !self.is_defined(name) {
            return Err(RuntimeError::with_stmt(ErrorCode::InvIdentif, name));
        }
        let next = self.get(name)?.decrement()?;
        self.bindings.insert(name.to_string(), next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_variable_is_var_undef() {
        let ctx = Context::new();
        let err = ctx.get("missing").unwrap_err();
        assert_eq!(err.code, ErrorCode::VarUndef);
    }

    #[test]
    fn increment_mutates_binding_and_returns_new_value() {
        let mut ctx = Context::new();
        ctx.define("x", Value::int(0));
        let v = ctx.increment("x").unwrap();
        assert_eq!(v.to_int(), 1);
        assert_eq!(ctx.get("x").unwrap().to_int(), 1);
    }

    #[test]
    fn increment_of_undefined_name_is_invalid_identifier() {
        let mut ctx = Context::new();
        let err = ctx.increment("missing").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvIdentif);
    }
}
