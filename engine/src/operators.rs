//! The binary operator registry: a process-wide immutable map from
//! operator symbol/word to an id, plus the id-dispatch match that performs
//! the actual arithmetic.
//!
//! Grounded on `fhirpath::functions`'s `phf::Map<&str, FunctionMetadata>` →
//! id → `match`-dispatch pattern: the map itself never stores a function
//! pointer, only an id, keeping the table a `const`-friendly `phf::Map`.

use phf::phf_map;

use crate::error::RuntimeError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorId {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Xor,
    Mod,
    BOr,
    BAnd,
    BXor,
    BShr,
    BShl,
}

/// Operator symbol/word → id. Case-insensitive word operators are
/// normalized to lowercase before lookup by the compiler.
pub static OPERATORS: phf::Map<&'static str, OperatorId> = phf_map! {
    "+" => OperatorId::Add,
    "-" => OperatorId::Sub,
    "*" => OperatorId::Mul,
    "/" => OperatorId::Div,
    "\\" => OperatorId::IntDiv,
    "div" => OperatorId::IntDiv,
    "^" => OperatorId::Pow,
    "=" => OperatorId::Eq,
    "<>" => OperatorId::Ne,
    "<" => OperatorId::Lt,
    ">" => OperatorId::Gt,
    "<=" => OperatorId::Le,
    ">=" => OperatorId::Ge,
    "and" => OperatorId::And,
    "or" => OperatorId::Or,
    "xor" => OperatorId::Xor,
    "mod" => OperatorId::Mod,
    "bor" => OperatorId::BOr,
    "band" => OperatorId::BAnd,
    "bxor" => OperatorId::BXor,
    "bshr" => OperatorId::BShr,
    "bshl" => OperatorId::BShl,
};

pub fn is_registered(symbol: &str) -> bool {
    OPERATORS.contains_key(&symbol.to_ascii_lowercase())
}

pub fn resolve(symbol: &str) -> Option<&'static str> {
    OPERATORS
        .keys()
        .find(|k| k.eq_ignore_ascii_case(symbol))
        .copied()
}

pub fn apply(symbol: &str, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let id = *OPERATORS
        .get(&symbol.to_ascii_lowercase())
        .unwrap_or_else(|| panic!("apply called with unregistered operator {symbol}"));
    match id {
        OperatorId::Add => left.add(right),
        OperatorId::Sub => left.sub(right),
        OperatorId::Mul => left.mul(right),
        OperatorId::Div => left.div(right),
        OperatorId::IntDiv => left.int_div(right),
        OperatorId::Pow => left.pow(right),
        OperatorId::Eq => left.cmp_eq(right),
        OperatorId::Ne => left.cmp_ne(right),
        OperatorId::Lt => left.cmp_lt(right),
        OperatorId::Gt => left.cmp_gt(right),
        OperatorId::Le => left.cmp_le(right),
        OperatorId::Ge => left.cmp_ge(right),
        OperatorId::And => Ok(left.logical_and(right)),
        OperatorId::Or => Ok(left.logical_or(right)),
        OperatorId::Xor => Ok(left.logical_xor(right)),
        OperatorId::Mod => left.int_mod(right),
        OperatorId::BOr => Ok(left.bitwise_or(right)),
        OperatorId::BAnd => Ok(left.bitwise_and(right)),
        OperatorId::BXor => Ok(left.bitwise_xor(right)),
        OperatorId::BShr => Ok(left.bitwise_shr(right)),
        OperatorId::BShl => Ok(left.bitwise_shl(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_documented_operator_is_registered() {
        for sym in [
            "+", "-", "*", "/", "\\", "^", "=", "<>", "<", ">", "<=", ">=", "and", "or", "xor",
            "mod", "div", "bor", "band", "bxor", "bshr", "bshl",
        ] {
            assert!(is_registered(sym), "{sym} should be registered");
        }
    }

    #[test]
    fn div_and_backslash_share_int_div_semantics() {
        let a = Value::int(7);
        let b = Value::int(2);
        assert_eq!(apply("div", &a, &b).unwrap().to_int(), apply("\\", &a, &b).unwrap().to_int());
    }
}
