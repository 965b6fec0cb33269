//! Named scenario coverage: one `#[test]` per row of worked input/output
//! pairs, mirroring the teacher crate's `unit_parser.rs`/`unit_vm.rs` style
//! of concrete end-to-end cases rather than generated ones.

use expr_engine::{evaluate, Context, Error, ErrorCode, Value};

fn eval(src: &str) -> Value {
    let mut ctx = Context::new();
    evaluate(src, &mut ctx).unwrap()
}

fn eval_with(src: &str, ctx: &mut Context) -> Value {
    evaluate(src, ctx).unwrap()
}

fn err_code(src: &str) -> ErrorCode {
    let mut ctx = Context::new();
    match evaluate(src, &mut ctx).unwrap_err() {
        Error::Runtime(e) => e.code,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn flat_fold_has_no_precedence() {
    // Binary operators share one precedence and fold strictly
    // left-to-right: (1+2)*3, not 1+(2*3).
    assert_eq!(eval("1+2*3").to_int(), 9);
}

#[test]
fn parentheses_override_the_fold() {
    assert_eq!(eval("(1+2)*3").to_int(), 9);
}

#[test]
fn len_of_string_literal() {
    assert_eq!(eval(r#"len("hello")"#).to_int(), 5);
}

#[test]
fn mid_is_one_based_inclusive() {
    assert_eq!(eval(r#"mid("abcdef",2,3)"#).to_str(), "bcd");
}

#[test]
fn split_exponent_literal_is_repaired() {
    let v = eval("1E-3+1");
    assert!((v.to_double() - 1.001).abs() < 1e-9);
}

#[test]
fn variable_lookup_from_context() {
    let mut ctx = Context::new();
    ctx.define("x", Value::int(41));
    assert_eq!(eval_with("x+1", &mut ctx).to_int(), 42);
}

#[test]
fn prefix_increment_mutates_context_and_returns_new_value() {
    let mut ctx = Context::new();
    ctx.define("x", Value::int(0));
    let v = eval_with("++x", &mut ctx);
    assert_eq!(v.to_int(), 1);
    assert_eq!(ctx.get("x").unwrap().to_int(), 1);
}

#[test]
fn division_by_zero_is_e_div_by_zero() {
    assert_eq!(err_code("1/0"), ErrorCode::DivByZero);
}

#[test]
fn undefined_function_with_no_matching_variable_is_e_func_undef() {
    assert_eq!(err_code("foo(1)"), ErrorCode::FuncUndef);
}

#[test]
fn string_plus_string_concatenates() {
    assert_eq!(eval(r#""a"+"b""#).to_str(), "ab");
}
