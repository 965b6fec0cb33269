//! `expr-engine`: an infix expression evaluator in the spirit of classic
//! BASIC — a tokenizer, a flat (precedence-free) recursive-descent
//! compiler, a numerically-coercing variant value, and dispatch tables of
//! binary operators and named functions.
//!
//! The only entry point most callers need is [`evaluate`].

pub mod ast;
pub mod context;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod token;
pub mod value;

pub use context::Context;
pub use error::{Error, ErrorCode, Result, RuntimeError, SyntaxError};
pub use value::Value;

use lexer::{LexPolicy, Lexer};

/// Evaluates `source` against `ctx`, returning the resulting value or a
/// structured [`Error`]. Pure modulo `++`/`--` mutations of `ctx`'s
/// bindings.
pub fn evaluate(source: &str, ctx: &mut Context) -> Result<Value> {
    let policy = LexPolicy::default();
    tracing::trace!(source, "tokenizing");
    let tokens = Lexer::new(source, &policy).tokenize()?;
    tracing::trace!(count = tokens.len(), "compiling");
    let tree = parser::compile(tokens, source)?;
    tracing::debug!("evaluating");
    Ok(tree.evaluate(ctx)?)
}

/// A valid identifier begins with a letter or underscore (a lone `_` is
/// invalid) and continues with letters, digits, underscores, or dots (dots
/// may not repeat).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    if name == "_" {
        return false;
    }
    let mut seen_dot = false;
    for c in chars {
        if c == '.' {
            if seen_dot {
                return false;
            }
            seen_dot = true;
        } else if !(c.is_alphanumeric() || c == '_') {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_underscore_is_invalid() {
        assert!(!is_valid_identifier("_"));
    }

    #[test]
    fn repeated_dots_are_invalid() {
        assert!(!is_valid_identifier("a..b"));
    }

    #[test]
    fn ordinary_names_are_valid() {
        assert!(is_valid_identifier("x"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("a.b"));
    }

    #[test]
    fn variable_lookup_reads_from_context() {
        let mut ctx = Context::new();
        ctx.define("x", Value::int(41));
        let v = evaluate("x+1", &mut ctx).unwrap();
        assert_eq!(v.to_int(), 42);
    }

    #[test]
    fn increment_mutates_context() {
        let mut ctx = Context::new();
        ctx.define("x", Value::int(0));
        let v = evaluate("++x", &mut ctx).unwrap();
        assert_eq!(v.to_int(), 1);
        assert_eq!(ctx.get("x").unwrap().to_int(), 1);
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let mut ctx = Context::new();
        let err = evaluate("1/0", &mut ctx).unwrap_err();
        match err {
            Error::Runtime(e) => assert_eq!(e.code, ErrorCode::DivByZero),
            other => panic!("expected runtime error, got {other:?}"),
        }
    }

    #[test]
    fn undefined_function_and_variable_is_func_undef() {
        let mut ctx = Context::new();
        let err = evaluate("foo(1)", &mut ctx).unwrap_err();
        match err {
            Error::Runtime(e) => assert_eq!(e.code, ErrorCode::FuncUndef),
            other => panic!("expected runtime error, got {other:?}"),
        }
    }

    #[test]
    fn string_concat_via_plus() {
        let mut ctx = Context::new();
        let v = evaluate(r#""a"+"b""#, &mut ctx).unwrap();
        assert_eq!(v.to_str(), "ab");
    }
}
