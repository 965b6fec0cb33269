//! The polymorphic variant value: typed, numeric-coercing, with
//! scalar/vector duality.
//!
//! Grounded on `nu_variant.cc`/`nu_variable.h` from the original
//! implementation: eight type tags, two numeric stores (integral vs
//! floating) plus a string store, widening arithmetic, and total
//! coercions that never panic.

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{ErrorCode, RuntimeError};

/// The eight type tags, used for widening and dispatch decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueType {
    // Order matters: widening picks the *greater* of two operand types.
    Boolean,
    Integer,
    Long64,
    Float,
    Double,
    Str,
    Any,
    Undefined,
}

impl ValueType {
    pub fn is_integral(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Long64 | ValueType::Boolean)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Double)
    }

    pub fn is_number(self) -> bool {
        self.is_integral() || self.is_floating()
    }
}

/// Parses the leading numeric prefix of a string (matching `nu::stod`'s
/// strtod-style behavior), so `"12abc"` coerces to `12`, not `0`.
pub(crate) fn leading_numeric_prefix(s: &str) -> f64 {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let mut end = i;
    let mut has_digits = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        has_digits = true;
    }
    i = end;
    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > i + 1 {
            has_digits = true;
            end = j;
            i = j;
        }
    }
    if has_digits && i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }
    if !has_digits {
        return 0.0;
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

#[derive(Debug, Clone)]
enum Store {
    Undefined,
    Any,
    Bool(SmallVec<[bool; 1]>),
    Integer(SmallVec<[i32; 1]>),
    Long(SmallVec<[i64; 1]>),
    Float(SmallVec<[f32; 1]>),
    Double(SmallVec<[f64; 1]>),
    Str(SmallVec<[String; 1]>),
}

/// A typed value: scalar or vector. The scalar/vector distinction is
/// `is_vector` plus the store's length: a scalar always has exactly one
/// element and `is_vector == false`; a vector has `is_vector == true` and a
/// declared length equal to the store's length (a length-1 vector is legal
/// and distinct from a scalar).
#[derive(Debug, Clone)]
pub struct Value {
    store: Store,
    is_vector: bool,
}

impl Value {
    pub fn undefined() -> Self {
        Value { store: Store::Undefined, is_vector: false }
    }

    pub fn any() -> Self {
        Value { store: Store::Any, is_vector: false }
    }

    pub fn boolean(b: bool) -> Self {
        Value { store: Store::Bool(SmallVec::from_elem(b, 1)), is_vector: false }
    }

    pub fn int(i: i32) -> Self {
        Value { store: Store::Integer(SmallVec::from_elem(i, 1)), is_vector: false }
    }

    pub fn long(l: i64) -> Self {
        Value { store: Store::Long(SmallVec::from_elem(l, 1)), is_vector: false }
    }

    pub fn float(f: f32) -> Self {
        Value { store: Store::Float(SmallVec::from_elem(f, 1)), is_vector: false }
    }

    pub fn double(d: f64) -> Self {
        Value { store: Store::Double(SmallVec::from_elem(d, 1)), is_vector: false }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value { store: Store::Str(SmallVec::from_elem(s.into(), 1)), is_vector: false }
    }

    pub fn int_vector(items: Vec<i32>) -> Self {
        Value { store: Store::Integer(SmallVec::from_vec(items)), is_vector: true }
    }

    pub fn double_vector(items: Vec<f64>) -> Self {
        Value { store: Store::Double(SmallVec::from_vec(items)), is_vector: true }
    }

    pub fn string_vector(items: Vec<String>) -> Self {
        Value { store: Store::Str(SmallVec::from_vec(items)), is_vector: true }
    }

    pub fn value_type(&self) -> ValueType {
        match &self.store {
            Store::Undefined => ValueType::Undefined,
            Store::Any => ValueType::Any,
            Store::Bool(_) => ValueType::Boolean,
            Store::Integer(_) => ValueType::Integer,
            Store::Long(_) => ValueType::Long64,
            Store::Float(_) => ValueType::Float,
            Store::Double(_) => ValueType::Double,
            Store::Str(_) => ValueType::Str,
        }
    }

    pub fn is_vector(&self) -> bool {
        self.is_vector
    }

    /// Declared length of the payload: 1 for any scalar.
    pub fn declared_len(&self) -> usize {
        match &self.store {
            Store::Undefined | Store::Any => 1,
            Store::Bool(v) => v.len(),
            Store::Integer(v) => v.len(),
            Store::Long(v) => v.len(),
            Store::Float(v) => v.len(),
            Store::Double(v) => v.len(),
            Store::Str(v) => v.len(),
        }
    }

    /// Index into a vector (or scalar, as index 0) yielding a scalar of the
    /// same type. Out-of-range is a runtime error (E_VAL_OUT_OF_RANGE), not
    /// a panic.
    pub fn at(&self, i: usize) -> Result<Value, RuntimeError> {
        let oob = || RuntimeError::new(ErrorCode::ValOutOfRange);
        match &self.store {
            Store::Undefined => Err(oob()),
            Store::Any => Err(oob()),
            Store::Bool(v) => v.get(i).map(|x| Value::boolean(*x)).ok_or_else(oob),
            Store::Integer(v) => v.get(i).map(|x| Value::int(*x)).ok_or_else(oob),
            Store::Long(v) => v.get(i).map(|x| Value::long(*x)).ok_or_else(oob),
            Store::Float(v) => v.get(i).map(|x| Value::float(*x)).ok_or_else(oob),
            Store::Double(v) => v.get(i).map(|x| Value::double(*x)).ok_or_else(oob),
            Store::Str(v) => v.get(i).map(|x| Value::string(x.clone())).ok_or_else(oob),
        }
    }

    // --- coercions (total, never panic) -----------------------------------

    pub fn to_int(&self) -> i32 {
        match &self.store {
            Store::Undefined | Store::Any => 0,
            Store::Bool(v) => v.first().copied().unwrap_or(false) as i32,
            Store::Integer(v) => v.first().copied().unwrap_or(0),
            Store::Long(v) => v.first().copied().unwrap_or(0) as i32,
            Store::Float(v) => v.first().copied().unwrap_or(0.0) as i32,
            Store::Double(v) => v.first().copied().unwrap_or(0.0) as i32,
            Store::Str(v) => v.first().map(|s| leading_numeric_prefix(s)).unwrap_or(0.0) as i32,
        }
    }

    pub fn to_long64(&self) -> i64 {
        match &self.store {
            Store::Undefined | Store::Any => 0,
            Store::Bool(v) => v.first().copied().unwrap_or(false) as i64,
            Store::Integer(v) => v.first().copied().unwrap_or(0) as i64,
            Store::Long(v) => v.first().copied().unwrap_or(0),
            Store::Float(v) => v.first().copied().unwrap_or(0.0) as i64,
            Store::Double(v) => v.first().copied().unwrap_or(0.0) as i64,
            Store::Str(v) => v.first().map(|s| leading_numeric_prefix(s)).unwrap_or(0.0) as i64,
        }
    }

    pub fn to_real(&self) -> f32 {
        self.to_double() as f32
    }

    pub fn to_double(&self) -> f64 {
        match &self.store {
            Store::Undefined | Store::Any => 0.0,
            Store::Bool(v) => (v.first().copied().unwrap_or(false) as i32) as f64,
            Store::Integer(v) => v.first().copied().unwrap_or(0) as f64,
            Store::Long(v) => v.first().copied().unwrap_or(0) as f64,
            Store::Float(v) => v.first().copied().unwrap_or(0.0) as f64,
            Store::Double(v) => v.first().copied().unwrap_or(0.0),
            Store::Str(v) => v.first().map(|s| leading_numeric_prefix(s)).unwrap_or(0.0),
        }
    }

    pub fn to_str(&self) -> String {
        match &self.store {
            Store::Undefined | Store::Any => String::new(),
            Store::Bool(v) => v.first().copied().unwrap_or(false).to_string(),
            Store::Integer(v) => v.first().copied().unwrap_or(0).to_string(),
            Store::Long(v) => v.first().copied().unwrap_or(0).to_string(),
            Store::Float(v) => format!("{}", v.first().copied().unwrap_or(0.0)),
            Store::Double(v) => format!("{}", v.first().copied().unwrap_or(0.0)),
            Store::Str(v) => v.first().cloned().unwrap_or_default(),
        }
    }

    pub fn to_bool(&self) -> bool {
        match &self.store {
            Store::Undefined | Store::Any => false,
            Store::Bool(v) => v.first().copied().unwrap_or(false),
            Store::Str(v) => !v.first().map(String::is_empty).unwrap_or(true),
            _ => self.to_double() != 0.0,
        }
    }

    // --- arithmetic ---------------------------------------------------------

    fn widen(a: ValueType, b: ValueType) -> ValueType {
        // DOUBLE > FLOAT > LONG64 > INTEGER > BOOLEAN, expressed via the
        // ValueType variant order declared above.
        a.max(b)
    }

    pub fn add(&self, other: &Value) -> Result<Value, RuntimeError> {
        if self.value_type() == ValueType::Str && other.value_type() == ValueType::Str {
            return Ok(Value::string(format!("{}{}", self.to_str(), other.to_str())));
        }
        self.numeric_binop(other, i64::wrapping_add, |a, b| a + b)
    }

    pub fn sub(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.numeric_binop(other, i64::wrapping_sub, |a, b| a - b)
    }

    pub fn mul(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.numeric_binop(other, i64::wrapping_mul, |a, b| a * b)
    }

    pub fn div(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.require_numbers(other)?;
        let divisor = other.to_double();
        if divisor == 0.0 {
            return Err(RuntimeError::new(ErrorCode::DivByZero));
        }
        Ok(Value::double(self.to_double() / divisor))
    }

    /// Integer division (`div` / `\`): both operands integral, result
    /// LONG64 if either operand is LONG64 else INTEGER.
    pub fn int_div(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.require_integral(other)?;
        let divisor = other.to_long64();
        if divisor == 0 {
            return Err(RuntimeError::new(ErrorCode::DivByZero));
        }
        let result = self.to_long64() / divisor;
        if self.value_type() == ValueType::Long64 || other.value_type() == ValueType::Long64 {
            Ok(Value::long(result))
        } else {
            Ok(Value::int(result as i32))
        }
    }

    pub fn int_mod(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.require_integral(other)?;
        let divisor = other.to_long64();
        if divisor == 0 {
            return Err(RuntimeError::new(ErrorCode::DivByZero));
        }
        let result = self.to_long64() % divisor;
        if self.value_type() == ValueType::Long64 || other.value_type() == ValueType::Long64 {
            Ok(Value::long(result))
        } else {
            Ok(Value::int(result as i32))
        }
    }

    /// Power (`^`): DOUBLE/FLOAT propagate directly; otherwise the integral
    /// result is rounded (`pow(a,b)+0.5`) preserving the wider integral
    /// type.
    pub fn pow(&self, other: &Value) -> Result<Value, RuntimeError> {
        self.require_numbers(other)?;
        let a = self.value_type();
        let b = other.value_type();
        let result = self.to_double().powf(other.to_double());
        if a == ValueType::Double || b == ValueType::Double {
            Ok(Value::double(result))
        } else if a == ValueType::Float || b == ValueType::Float {
            Ok(Value::float(result as f32))
        } else if a == ValueType::Long64 || b == ValueType::Long64 {
            Ok(Value::long((result + 0.5) as i64))
        } else {
            Ok(Value::int((result + 0.5) as i32))
        }
    }

    /// Widened arithmetic for `+`/`-`/`*`: an integral result (LONG64 or
    /// INTEGER) is computed entirely in the `i64` domain so large LONG64
    /// operands don't round-trip through `f64` and lose precision; only a
    /// FLOAT/DOUBLE result goes through `float_op`.
    fn numeric_binop(
        &self,
        other: &Value,
        int_op: impl Fn(i64, i64) -> i64,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value, RuntimeError> {
        self.require_numbers(other)?;
        Ok(match Self::widen(self.value_type(), other.value_type()) {
            ValueType::Double => Value::double(float_op(self.to_double(), other.to_double())),
            ValueType::Float => Value::float(float_op(self.to_double(), other.to_double()) as f32),
            ValueType::Long64 => Value::long(int_op(self.to_long64(), other.to_long64())),
            _ => Value::int(int_op(self.to_long64(), other.to_long64()) as i32),
        })
    }

    fn require_numbers(&self, other: &Value) -> Result<(), RuntimeError> {
        if self.value_type().is_number() && other.value_type().is_number() {
            Ok(())
        } else {
            Err(RuntimeError::new(ErrorCode::TypeMismatch))
        }
    }

    fn require_integral(&self, other: &Value) -> Result<(), RuntimeError> {
        if self.value_type().is_integral() && other.value_type().is_integral() {
            Ok(())
        } else {
            Err(RuntimeError::new(ErrorCode::TypeMismatch))
        }
    }

    // --- comparisons ----------------------------------------------------

    pub fn cmp_eq(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::boolean(self.compare(other)? == Ordering::Equal))
    }

    pub fn cmp_ne(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::boolean(self.compare(other)? != Ordering::Equal))
    }

    pub fn cmp_lt(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::boolean(self.compare(other)? == Ordering::Less))
    }

    pub fn cmp_le(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::boolean(self.compare(other)? != Ordering::Greater))
    }

    pub fn cmp_gt(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::boolean(self.compare(other)? == Ordering::Greater))
    }

    pub fn cmp_ge(&self, other: &Value) -> Result<Value, RuntimeError> {
        Ok(Value::boolean(self.compare(other)? != Ordering::Less))
    }

    fn compare(&self, other: &Value) -> Result<Ordering, RuntimeError> {
        if self.value_type() == ValueType::Str || other.value_type() == ValueType::Str {
            return Ok(self.to_str().cmp(&other.to_str()));
        }
        if self.value_type() == ValueType::Boolean && other.value_type() == ValueType::Boolean {
            return Ok(self.to_bool().cmp(&other.to_bool()));
        }
        self.require_numbers(other)?;
        self.to_double()
            .partial_cmp(&other.to_double())
            .ok_or_else(|| RuntimeError::new(ErrorCode::TypeMismatch))
    }

    // --- logical / bitwise -------------------------------------------------

    pub fn logical_and(&self, other: &Value) -> Value {
        Value::boolean(self.to_bool() && other.to_bool())
    }

    pub fn logical_or(&self, other: &Value) -> Value {
        Value::boolean(self.to_bool() || other.to_bool())
    }

    pub fn logical_xor(&self, other: &Value) -> Value {
        Value::boolean(self.to_bool() != other.to_bool())
    }

    pub fn bitwise_or(&self, other: &Value) -> Value {
        Value::int(self.to_int() | other.to_int())
    }

    pub fn bitwise_and(&self, other: &Value) -> Value {
        Value::int(self.to_int() & other.to_int())
    }

    pub fn bitwise_xor(&self, other: &Value) -> Value {
        Value::int(self.to_int() ^ other.to_int())
    }

    pub fn bitwise_shr(&self, other: &Value) -> Value {
        Value::int(self.to_int().wrapping_shr(other.to_int() as u32))
    }

    pub fn bitwise_shl(&self, other: &Value) -> Value {
        Value::int(self.to_int().wrapping_shl(other.to_int() as u32))
    }

    // --- increment / decrement -------------------------------------------

    /// `++`: operand must be a named scalar variable of integral (excluding
    /// BOOLEAN) or floating type. Vectors are E_TYPE_ILLEGAL.
    pub fn increment(&self) -> Result<Value, RuntimeError> {
        self.step(1.0)
    }

    pub fn decrement(&self) -> Result<Value, RuntimeError> {
        self.step(-1.0)
    }

    fn step(&self, delta: f64) -> Result<Value, RuntimeError> {
        if self.is_vector {
            return Err(RuntimeError::new(ErrorCode::TypeIllegal));
        }
        match self.value_type() {
            ValueType::Integer => Ok(Value::int(self.to_int() + delta as i32)),
            ValueType::Long64 => Ok(Value::long(self.to_long64() + delta as i64)),
            ValueType::Float => Ok(Value::float(self.to_real() + delta as f32)),
            ValueType::Double => Ok(Value::double(self.to_double() + delta)),
            _ => Err(RuntimeError::new(ErrorCode::TypeIllegal)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_widens_to_double() {
        let v = Value::int(1).add(&Value::double(2.5)).unwrap();
        assert_eq!(v.value_type(), ValueType::Double);
        assert_eq!(v.to_double(), 3.5);
    }

    #[test]
    fn string_concat_on_plus() {
        let v = Value::string("a").add(&Value::string("b")).unwrap();
        assert_eq!(v.to_str(), "ab");
    }

    #[test]
    fn div_by_zero_is_runtime_error() {
        let err = Value::int(1).div(&Value::int(0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DivByZero);
    }

    #[test]
    fn div_always_yields_double() {
        let v = Value::int(4).div(&Value::int(2)).unwrap();
        assert_eq!(v.value_type(), ValueType::Double);
    }

    #[test]
    fn int_div_widens_to_long_when_either_is_long() {
        let v = Value::int(7).int_div(&Value::long(2)).unwrap();
        assert_eq!(v.value_type(), ValueType::Long64);
        assert_eq!(v.to_long64(), 3);
    }

    #[test]
    fn boolean_excluded_from_increment() {
        let err = Value::boolean(true).increment().unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeIllegal);
    }

    #[test]
    fn vector_increment_is_type_illegal() {
        let err = Value::int_vector(vec![1, 2]).increment().unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeIllegal);
    }

    #[test]
    fn out_of_range_index_is_runtime_error() {
        let v = Value::int_vector(vec![1, 2, 3]);
        assert!(v.at(5).is_err());
        assert_eq!(v.at(1).unwrap().to_int(), 2);
    }

    #[test]
    fn unparseable_string_to_numeric_is_zero() {
        assert_eq!(Value::string("not a number").to_int(), 0);
    }

    #[test]
    fn string_with_trailing_garbage_coerces_to_leading_number() {
        assert_eq!(Value::string("12abc").to_int(), 12);
        assert_eq!(Value::string("  -3.5xyz").to_double(), -3.5);
    }

    #[test]
    fn large_long_addition_keeps_full_precision() {
        let v = Value::long(1_000_000_000_000_000_001).add(&Value::int(0)).unwrap();
        assert_eq!(v.to_long64(), 1_000_000_000_000_000_001);
    }

    #[test]
    fn large_long_subtraction_keeps_full_precision() {
        let v = Value::long(1_000_000_000_000_000_001).sub(&Value::long(1)).unwrap();
        assert_eq!(v.to_long64(), 1_000_000_000_000_000_000);
    }
}
