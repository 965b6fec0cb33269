//! The named-function registry: a process-wide immutable map from
//! lowercase name to arity metadata, plus the id-by-name dispatch that
//! performs the call.
//!
//! Grounded on `fhirpath::functions::FUNCTIONS_BY_NAME` (`phf::Map<&str,
//! FunctionMetadata>`, `min_args`/`max_args` fields, a
//! `validate_args`-before-evaluation entry point).

use std::sync::{Mutex, OnceLock};

use phf::phf_map;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::context::Context;
use crate::error::{ErrorCode, RuntimeError};
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy)]
pub struct FunctionMeta {
    pub min_args: usize,
    pub max_args: usize,
}

macro_rules! fixed_arity {
    ($n:expr) => {
        FunctionMeta { min_args: $n, max_args: $n }
    };
}

/// Name → arity metadata. All builtins here are fixed-arity; there are no
/// variadic entries in this language.
pub static FUNCTIONS: phf::Map<&'static str, FunctionMeta> = phf_map! {
    "sin" => fixed_arity!(1),
    "cos" => fixed_arity!(1),
    "tan" => fixed_arity!(1),
    "asin" => fixed_arity!(1),
    "acos" => fixed_arity!(1),
    "atan" => fixed_arity!(1),
    "sinh" => fixed_arity!(1),
    "cosh" => fixed_arity!(1),
    "tanh" => fixed_arity!(1),
    "log" => fixed_arity!(1),
    "log10" => fixed_arity!(1),
    "exp" => fixed_arity!(1),
    "abs" => fixed_arity!(1),
    "sqrt" => fixed_arity!(1),
    "sqr" => fixed_arity!(1),
    "sign" => fixed_arity!(1),
    "truncf" => fixed_arity!(1),
    "min" => fixed_arity!(2),
    "max" => fixed_arity!(2),
    "pow" => fixed_arity!(2),
    "int" => fixed_arity!(1),
    "rnd" => fixed_arity!(1),
    "not" => fixed_arity!(1),
    "b_not" => fixed_arity!(1),
    "len" => fixed_arity!(1),
    "asc" => fixed_arity!(1),
    "spc" => fixed_arity!(1),
    "chr" => fixed_arity!(1),
    "left" => fixed_arity!(2),
    "right" => fixed_arity!(2),
    "lcase" => fixed_arity!(1),
    "ucase" => fixed_arity!(1),
    "substr" => fixed_arity!(3),
    "mid" => fixed_arity!(3),
    "pstr" => fixed_arity!(3),
    "instr" => fixed_arity!(2),
    "instrcs" => fixed_arity!(2),
    "val" => fixed_arity!(1),
    "str" => fixed_arity!(1),
    "strp" => fixed_arity!(2),
    "hex" => fixed_arity!(1),
    "pi" => fixed_arity!(0),
    "size" => fixed_arity!(1),
};

pub fn is_registered(name: &str) -> bool {
    FUNCTIONS.contains_key(name)
}

/// Min/max argument count for a registered name. Arity is a structural
/// property of the call syntax, so the compiler checks it at parse time
/// rather than waiting for evaluation — which also means an arity mismatch
/// can never trigger a side effect from an unevaluated argument.
pub fn arity_bounds(name: &str) -> (usize, usize) {
    let meta = FUNCTIONS
        .get(name)
        .unwrap_or_else(|| panic!("arity_bounds called on unregistered function {name}"));
    (meta.min_args, meta.max_args)
}

pub fn call(name: &str, args: &[Value], _ctx: &mut Context) -> Result<Value, RuntimeError> {
    match name {
        "sin" => Ok(Value::double(args[0].to_double().sin())),
        "cos" => Ok(Value::double(args[0].to_double().cos())),
        "tan" => Ok(Value::double(args[0].to_double().tan())),
        "asin" => Ok(Value::double(args[0].to_double().asin())),
        "acos" => Ok(Value::double(args[0].to_double().acos())),
        "atan" => Ok(Value::double(args[0].to_double().atan())),
        "sinh" => Ok(Value::double(args[0].to_double().sinh())),
        "cosh" => Ok(Value::double(args[0].to_double().cosh())),
        "tanh" => Ok(Value::double(args[0].to_double().tanh())),
        "log" => Ok(Value::double(args[0].to_double().ln())),
        "log10" => Ok(Value::double(args[0].to_double().log10())),
        "exp" => Ok(Value::double(args[0].to_double().exp())),
        "abs" => Ok(Value::double(args[0].to_double().abs())),
        "sqrt" | "sqr" => Ok(Value::double(args[0].to_double().sqrt())),
        "sign" => {
            let x = args[0].to_double();
            let s = if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            };
            Ok(Value::double(s))
        }

        // Quirk preserved from the source: truncf requires a FLOAT operand
        // specifically; callers passing a DOUBLE hit a type mismatch.
        "truncf" => {
            if args[0].value_type() != ValueType::Float {
                return Err(RuntimeError::with_stmt(ErrorCode::TypeMismatch, name));
            }
            Ok(Value::float(args[0].to_real().trunc()))
        }

        "min" => Ok(Value::double(args[0].to_double().min(args[1].to_double()))),
        "max" => Ok(Value::double(args[0].to_double().max(args[1].to_double()))),
        "pow" => Ok(Value::double(args[0].to_double().powf(args[1].to_double()))),

        // floor() agrees with "truncate toward 0" for non-negative inputs
        // and with "floor toward -inf" for negative inputs, so one
        // expression covers both halves of the documented rounding rule.
        "int" => Ok(Value::int(args[0].to_double().floor() as i32)),

        "rnd" => Ok(rnd(args[0].to_double())),

        // Callable form returns an integer, distinct from the unary `not`
        // operand form, which returns BOOLEAN.
        "not" => Ok(Value::int(if args[0].to_bool() { 0 } else { 1 })),
        "b_not" => Ok(Value::int(!args[0].to_int())),

        "len" => Ok(Value::int(args[0].to_str().len() as i32)),
        "asc" => Ok(Value::int(
            args[0].to_str().as_bytes().first().copied().unwrap_or(0) as i32,
        )),
        "spc" => {
            let n = args[0].to_int().max(0) as usize;
            Ok(Value::string(" ".repeat(n)))
        }
        "chr" => {
            let byte = args[0].to_int() as u8;
            Ok(Value::string(String::from_utf8_lossy(&[byte]).into_owned()))
        }
        "left" => Ok(Value::string(left(&args[0].to_str(), args[1].to_int()))),
        "right" => Ok(Value::string(right(&args[0].to_str(), args[1].to_int()))),
        "lcase" => Ok(Value::string(args[0].to_str().to_lowercase())),
        "ucase" => Ok(Value::string(args[0].to_str().to_uppercase())),
        "substr" => Ok(Value::string(substr(
            &args[0].to_str(),
            args[1].to_int(),
            args[2].to_int(),
        ))),
        "mid" => Ok(Value::string(mid(&args[0].to_str(), args[1].to_int(), args[2].to_int()))),
        "pstr" => Ok(Value::string(pstr(
            &args[0].to_str(),
            args[1].to_int(),
            &args[2].to_str(),
        ))),
        "instr" => Ok(Value::int(find_index(
            &args[0].to_str().to_lowercase(),
            &args[1].to_str().to_lowercase(),
        ))),
        "instrcs" => Ok(Value::int(find_index(&args[0].to_str(), &args[1].to_str()))),
        "val" => Ok(Value::double(args[0].to_double())),
        "str" => {
            let x = &args[0];
            if matches!(x.value_type(), ValueType::Integer | ValueType::Long64) {
                Ok(Value::string(x.to_long64().to_string()))
            } else {
                Ok(Value::string(format!("{}", x.to_double())))
            }
        }
        "strp" => {
            let digits = args[1].to_int().unsigned_abs() as usize;
            Ok(Value::string(format!("{:.*}", digits, args[0].to_double())))
        }

        // Two's-complement of the native (32-bit) integer width, matching
        // `int(x)` truncation in the original table before formatting.
        "hex" => {
            let truncated = args[0].to_double().floor() as i32;
            Ok(Value::string(format!("{truncated:x}")))
        }

        "pi" => Ok(Value::double(std::f64::consts::PI)),
        "size" => Ok(Value::int(args[0].declared_len() as i32)),

        _ => unreachable!("call dispatched for unregistered function {name}"),
    }
}

fn left(s: &str, n: i32) -> String {
    if n <= 0 {
        return String::new();
    }
    let bytes = s.as_bytes();
    let n = (n as usize).min(bytes.len());
    String::from_utf8_lossy(&bytes[..n]).into_owned()
}

/// Quirk preserved from the source: `n <= 0` returns the *whole* string,
/// inconsistent with `left`'s empty-string behavior.
fn right(s: &str, n: i32) -> String {
    if n <= 0 {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let n = (n as usize).min(bytes.len());
    String::from_utf8_lossy(&bytes[bytes.len() - n..]).into_owned()
}

fn substr(s: &str, pos: i32, n: i32) -> String {
    let bytes = s.as_bytes();
    let pos = pos.clamp(0, bytes.len() as i32) as usize;
    let n = n.max(0) as usize;
    let end = (pos + n).min(bytes.len());
    String::from_utf8_lossy(&bytes[pos..end]).into_owned()
}

fn mid(s: &str, pos: i32, n: i32) -> String {
    let bytes = s.as_bytes();
    let pos = (pos.max(1) as usize - 1).min(bytes.len());
    let n = n.max(0) as usize;
    let end = (pos + n).min(bytes.len());
    String::from_utf8_lossy(&bytes[pos..end]).into_owned()
}

/// Writes a NUL byte when `c` is empty, matching `_patch_str`'s
/// `c_s.empty() ? '\0' : c_s[0]`.
fn pstr(s: &str, pos: i32, c: &str) -> String {
    let mut bytes = s.as_bytes().to_vec();
    if bytes.is_empty() {
        return String::new();
    }
    let pos = pos.clamp(0, (bytes.len() - 1) as i32) as usize;
    bytes[pos] = c.as_bytes().first().copied().unwrap_or(0);
    String::from_utf8_lossy(&bytes).into_owned()
}

fn find_index(haystack: &str, needle: &str) -> i32 {
    if needle.is_empty() {
        return 0;
    }
    match haystack.find(needle) {
        Some(byte_pos) => byte_pos as i32,
        None => -1,
    }
}

fn rng() -> &'static Mutex<StdRng> {
    static RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();
    RNG.get_or_init(|| Mutex::new(StdRng::from_entropy()))
}

fn rnd(x: f64) -> Value {
    let mut guard = rng().lock().unwrap_or_else(|e| e.into_inner());
    if x < 0.0 {
        *guard = StdRng::from_entropy();
    }
    Value::double(guard.gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_documented_functions_are_registered() {
        for name in [
            "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "log", "log10",
            "exp", "abs", "sqrt", "sqr", "sign", "truncf", "min", "max", "pow", "int", "rnd",
            "not", "b_not", "len", "asc", "spc", "chr", "left", "right", "lcase", "ucase",
            "substr", "mid", "pstr", "instr", "instrcs", "val", "str", "strp", "hex", "pi", "size",
        ] {
            assert!(is_registered(name), "{name} should be registered");
        }
    }

    #[test]
    fn arity_bounds_match_documented_signatures() {
        assert_eq!(arity_bounds("len"), (1, 1));
        assert_eq!(arity_bounds("substr"), (3, 3));
        assert_eq!(arity_bounds("pi"), (0, 0));
    }

    #[test]
    fn right_with_nonpositive_n_returns_whole_string() {
        assert_eq!(right("hello", 0), "hello");
        assert_eq!(right("hello", -3), "hello");
    }

    #[test]
    fn left_with_nonpositive_n_returns_empty() {
        assert_eq!(left("hello", 0), "");
        assert_eq!(left("hello", -3), "");
    }

    #[test]
    fn mid_is_one_based() {
        assert_eq!(mid("abcdef", 2, 3), "bcd");
    }

    #[test]
    fn instr_is_case_insensitive_and_empty_needle_is_zero() {
        assert_eq!(find_index(&"ABCDEF".to_lowercase(), &"cd".to_lowercase()), 2);
        assert_eq!(find_index("abc", ""), 0);
        assert_eq!(find_index("abc", "zz"), -1);
    }

    #[test]
    fn truncf_rejects_double() {
        let mut ctx = Context::new();
        let err = call("truncf", &[Value::double(1.5)], &mut ctx).unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeMismatch);
    }

    #[test]
    fn sign_of_zero_is_zero() {
        let mut ctx = Context::new();
        assert_eq!(call("sign", &[Value::int(0)], &mut ctx).unwrap().to_double(), 0.0);
        assert_eq!(call("sign", &[Value::int(5)], &mut ctx).unwrap().to_double(), 1.0);
        assert_eq!(call("sign", &[Value::int(-5)], &mut ctx).unwrap().to_double(), -1.0);
    }

    #[test]
    fn pstr_with_empty_replacement_writes_nul_byte() {
        assert_eq!(pstr("hello", 1, ""), "h\0llo");
    }

    #[test]
    fn val_stops_at_trailing_garbage() {
        let mut ctx = Context::new();
        let v = call("val", &[Value::string("12abc")], &mut ctx).unwrap();
        assert_eq!(v.to_double(), 12.0);
    }
}
