//! Value coercion: storing untyped document values into typed slots.
//!
//! Every [`Field`](crate::Field) type decides for itself whether an input may
//! be stored, using the conversion-legality table in this module for
//! scalars. Containers and nested records recurse through the
//! [`Coercer`] they are handed.

mod scalar;
mod temporal;

use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use sieve_core::TypeDesc;

use crate::cache;
use crate::error::{CoercionError, ConfigError};
use crate::field::Field;
use crate::options::Options;
use crate::plan::Descriptor;
use crate::schema::Record;

/// Entry point for recursive coercion, passed explicitly to every slot.
#[derive(Debug, Clone, Copy)]
pub struct Coercer<'a> {
    options: &'a Options,
}

impl<'a> Coercer<'a> {
    pub fn new(options: &'a Options) -> Self {
        Coercer { options }
    }

    pub fn options(&self) -> &'a Options {
        self.options
    }

    /// Coerce `input` into `slot`.
    pub fn coerce<T: Field>(&self, slot: &mut T, input: &Value) -> Result<(), CoercionError> {
        slot.coerce(input, self)
    }

    /// The cached descriptor of a nested record type.
    pub fn descriptor<R: Record>(&self) -> Result<Arc<Descriptor<R>>, ConfigError> {
        cache::cached::<R>(self.options)
    }
}

// ──────────────────────────────────────────────
// Conversion legality
// ──────────────────────────────────────────────

/// The shape of an untyped input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Null,
    Bool,
    Signed,
    Unsigned,
    Float,
    Text,
    Sequence,
    Mapping,
}

impl SourceKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => SourceKind::Null,
            Value::Bool(_) => SourceKind::Bool,
            Value::Number(n) => match Num::of(n) {
                Num::Int(_) => SourceKind::Signed,
                Num::Uint(_) => SourceKind::Unsigned,
                Num::Float(_) => SourceKind::Float,
            },
            Value::String(_) => SourceKind::Text,
            Value::Array(_) => SourceKind::Sequence,
            Value::Object(_) => SourceKind::Mapping,
        }
    }

    /// Descriptive name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Null => "null",
            SourceKind::Bool => "boolean",
            SourceKind::Signed | SourceKind::Unsigned => "integer",
            SourceKind::Float => "number",
            SourceKind::Text => "string",
            SourceKind::Sequence => "array",
            SourceKind::Mapping => "object",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            SourceKind::Signed | SourceKind::Unsigned | SourceKind::Float
        )
    }
}

/// The fundamental kind of a scalar destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Decimal,
    Text,
}

impl ScalarKind {
    fn is_numeric(self) -> bool {
        !matches!(self, ScalarKind::Bool | ScalarKind::Text)
    }
}

/// Whether a value of kind `source` may be stored in a `dest` slot.
///
/// Numeric kinds convert freely among themselves (any width, signed or
/// unsigned, float, decimal). Otherwise source and destination must share a
/// kind. Numeric to text and text to numeric are always rejected.
pub fn is_legal(source: SourceKind, dest: ScalarKind) -> bool {
    match (source, dest) {
        (s, ScalarKind::Text) if s.is_numeric() => false,
        (SourceKind::Text, d) if d.is_numeric() => false,
        (s, d) if s.is_numeric() && d.is_numeric() => true,
        (SourceKind::Bool, ScalarKind::Bool) => true,
        (SourceKind::Text, ScalarKind::Text) => true,
        _ => false,
    }
}

pub(crate) fn mismatch(expected: TypeDesc, input: &Value) -> CoercionError {
    CoercionError::TypeMismatch {
        expected,
        got: SourceKind::of(input).name(),
    }
}

/// Check `input` against the legality table for a scalar destination.
pub(crate) fn check(input: &Value, target: TypeDesc, kind: ScalarKind) -> Result<(), CoercionError> {
    if is_legal(SourceKind::of(input), kind) {
        Ok(())
    } else {
        Err(mismatch(target, input))
    }
}

/// A legal numeric input, or `None` for an explicit null.
pub(crate) fn numeric(
    input: &Value,
    target: TypeDesc,
    kind: ScalarKind,
) -> Result<Option<Num>, CoercionError> {
    match input {
        Value::Null => Ok(None),
        Value::Number(n) if is_legal(SourceKind::of(input), kind) => Ok(Some(Num::of(n))),
        other => Err(mismatch(target, other)),
    }
}

// ──────────────────────────────────────────────
// Numbers
// ──────────────────────────────────────────────

/// A JSON number split by representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Num {
    pub fn of(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            Num::Int(i)
        } else if let Some(u) = n.as_u64() {
            Num::Uint(u)
        } else {
            Num::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }

    fn out_of_range(self, target: TypeDesc) -> CoercionError {
        let value = match self {
            Num::Int(i) => i.to_string(),
            Num::Uint(u) => u.to_string(),
            Num::Float(f) => f.to_string(),
        };
        CoercionError::OutOfRange { value, target }
    }

    /// Convert to an integer type, range checked. Floats truncate toward zero.
    pub fn to_integer<T>(self, target: TypeDesc) -> Result<T, CoercionError>
    where
        T: TryFrom<i64> + TryFrom<u64>,
    {
        let converted = match self {
            Num::Int(i) => T::try_from(i).ok(),
            Num::Uint(u) => T::try_from(u).ok(),
            Num::Float(f) => {
                let t = f.trunc();
                if t >= i64::MIN as f64 && t < i64::MAX as f64 {
                    T::try_from(t as i64).ok()
                } else if t >= 0.0 && t < u64::MAX as f64 {
                    T::try_from(t as u64).ok()
                } else {
                    None
                }
            }
        };
        converted.ok_or_else(|| self.out_of_range(target))
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Uint(u) => u as f64,
            Num::Float(f) => f,
        }
    }

    pub fn to_f32(self, target: TypeDesc) -> Result<f32, CoercionError> {
        let wide = self.to_f64();
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(self.out_of_range(target));
        }
        Ok(narrow)
    }

    pub fn to_decimal(self, target: TypeDesc) -> Result<Decimal, CoercionError> {
        match self {
            Num::Int(i) => Ok(Decimal::from(i)),
            Num::Uint(u) => Ok(Decimal::from(u)),
            Num::Float(f) => Decimal::from_f64(f).ok_or_else(|| self.out_of_range(target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_kinds_interconvert() {
        for source in [SourceKind::Signed, SourceKind::Unsigned, SourceKind::Float] {
            for dest in [
                ScalarKind::Signed,
                ScalarKind::Unsigned,
                ScalarKind::Float,
                ScalarKind::Decimal,
            ] {
                assert!(is_legal(source, dest), "{:?} -> {:?}", source, dest);
            }
        }
    }

    #[test]
    fn numeric_to_text_rejected() {
        assert!(!is_legal(SourceKind::Signed, ScalarKind::Text));
        assert!(!is_legal(SourceKind::Unsigned, ScalarKind::Text));
        assert!(!is_legal(SourceKind::Float, ScalarKind::Text));
    }

    #[test]
    fn text_to_numeric_rejected() {
        assert!(!is_legal(SourceKind::Text, ScalarKind::Signed));
        assert!(!is_legal(SourceKind::Text, ScalarKind::Unsigned));
        assert!(!is_legal(SourceKind::Text, ScalarKind::Float));
        assert!(!is_legal(SourceKind::Text, ScalarKind::Decimal));
    }

    #[test]
    fn same_kind_legal() {
        assert!(is_legal(SourceKind::Bool, ScalarKind::Bool));
        assert!(is_legal(SourceKind::Text, ScalarKind::Text));
    }

    #[test]
    fn cross_kind_rejected() {
        assert!(!is_legal(SourceKind::Bool, ScalarKind::Signed));
        assert!(!is_legal(SourceKind::Signed, ScalarKind::Bool));
        assert!(!is_legal(SourceKind::Text, ScalarKind::Bool));
        assert!(!is_legal(SourceKind::Sequence, ScalarKind::Text));
        assert!(!is_legal(SourceKind::Mapping, ScalarKind::Float));
        assert!(!is_legal(SourceKind::Null, ScalarKind::Signed));
    }

    #[test]
    fn source_kind_of_numbers() {
        assert_eq!(SourceKind::of(&json!(-3)), SourceKind::Signed);
        assert_eq!(SourceKind::of(&json!(u64::MAX)), SourceKind::Unsigned);
        assert_eq!(SourceKind::of(&json!(1.5)), SourceKind::Float);
    }

    #[test]
    fn integer_range_checked() {
        assert_eq!(Num::Int(127).to_integer::<i8>(TypeDesc::I8), Ok(127i8));
        assert!(Num::Int(128).to_integer::<i8>(TypeDesc::I8).is_err());
        assert!(Num::Int(-1).to_integer::<u32>(TypeDesc::U32).is_err());
        assert_eq!(
            Num::Uint(u64::MAX).to_integer::<u64>(TypeDesc::U64),
            Ok(u64::MAX)
        );
        assert!(Num::Uint(u64::MAX).to_integer::<i64>(TypeDesc::I64).is_err());
    }

    #[test]
    fn float_to_integer_truncates() {
        assert_eq!(Num::Float(3.9).to_integer::<i32>(TypeDesc::I32), Ok(3));
        assert_eq!(Num::Float(-3.9).to_integer::<i32>(TypeDesc::I32), Ok(-3));
        assert!(Num::Float(1e30).to_integer::<i64>(TypeDesc::I64).is_err());
        assert!(Num::Float(f64::NAN).to_integer::<i64>(TypeDesc::I64).is_err());
    }

    #[test]
    fn f32_overflow_detected() {
        assert!(Num::Float(1e300).to_f32(TypeDesc::F32).is_err());
        assert_eq!(Num::Int(2).to_f32(TypeDesc::F32), Ok(2.0));
    }

    #[test]
    fn decimal_from_numbers() {
        assert_eq!(Num::Int(5).to_decimal(TypeDesc::Decimal), Ok(Decimal::from(5)));
        assert_eq!(
            Num::Float(0.25).to_decimal(TypeDesc::Decimal),
            Ok(Decimal::new(25, 2))
        );
    }
}
