//! Scalar slots: integers, floats, booleans, text and decimals.

use rust_decimal::Decimal;
use serde_json::Value;
use sieve_core::TypeDesc;

use super::{check, numeric, Coercer, ScalarKind};
use crate::defaults::{assign_or_skip, assign_parsed, parse_bool};
use crate::error::CoercionError;
use crate::field::Field;

macro_rules! integer_field {
    ($($ty:ty => $desc:ident, $kind:ident;)*) => {$(
        impl Field for $ty {
            fn zero() -> Self {
                0
            }

            fn type_desc() -> TypeDesc {
                TypeDesc::$desc
            }

            fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
                *self = match numeric(input, TypeDesc::$desc, ScalarKind::$kind)? {
                    Some(num) => num.to_integer(TypeDesc::$desc)?,
                    None => 0,
                };
                Ok(())
            }

            fn apply_default(&mut self, text: &str) {
                assign_parsed(self, text);
            }
        }
    )*};
}

integer_field! {
    i8 => I8, Signed;
    i16 => I16, Signed;
    i32 => I32, Signed;
    i64 => I64, Signed;
    isize => Isize, Signed;
    u8 => U8, Unsigned;
    u16 => U16, Unsigned;
    u32 => U32, Unsigned;
    u64 => U64, Unsigned;
    usize => Usize, Unsigned;
}

impl Field for f64 {
    fn zero() -> Self {
        0.0
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::F64
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        *self = match numeric(input, TypeDesc::F64, ScalarKind::Float)? {
            Some(num) => num.to_f64(),
            None => 0.0,
        };
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        assign_parsed(self, text);
    }
}

impl Field for f32 {
    fn zero() -> Self {
        0.0
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::F32
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        *self = match numeric(input, TypeDesc::F32, ScalarKind::Float)? {
            Some(num) => num.to_f32(TypeDesc::F32)?,
            None => 0.0,
        };
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        assign_parsed(self, text);
    }
}

impl Field for Decimal {
    fn zero() -> Self {
        Decimal::ZERO
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::Decimal
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        *self = match numeric(input, TypeDesc::Decimal, ScalarKind::Decimal)? {
            Some(num) => num.to_decimal(TypeDesc::Decimal)?,
            None => Decimal::ZERO,
        };
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        assign_parsed(self, text);
    }
}

impl Field for bool {
    fn zero() -> Self {
        false
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::Bool
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        if input.is_null() {
            *self = false;
            return Ok(());
        }
        check(input, TypeDesc::Bool, ScalarKind::Bool)?;
        *self = input.as_bool().unwrap_or_default();
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        assign_or_skip(self, text, parse_bool(text));
    }
}

impl Field for String {
    fn zero() -> Self {
        String::new()
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::String
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        if input.is_null() {
            self.clear();
            return Ok(());
        }
        check(input, TypeDesc::String, ScalarKind::Text)?;
        *self = input.as_str().unwrap_or_default().to_string();
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        *self = text.to_string();
    }
}
