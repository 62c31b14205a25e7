//! Declared field types.
//!
//! [`TypeDesc`] names the structural shape of a record field. It is used in
//! diagnostics, to validate computed-default signatures, and by schema
//! projections that need to know what a field holds.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum TypeDesc {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Decimal,
    String,
    /// A point in time with offset.
    Timestamp,
    Duration,
    /// Any untyped document value.
    Any,
    Optional(Box<TypeDesc>),
    Sequence(Box<TypeDesc>),
    /// Mapping from text keys to values of the given type.
    Mapping(Box<TypeDesc>),
    /// A nested record, by type name.
    Record(String),
    /// An error value; only meaningful as a method return type.
    Error,
    /// A type outside the field vocabulary, by Rust type name. Only appears
    /// in method signatures.
    Named(String),
}

impl TypeDesc {
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            TypeDesc::I8 | TypeDesc::I16 | TypeDesc::I32 | TypeDesc::I64 | TypeDesc::Isize
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            TypeDesc::U8 | TypeDesc::U16 | TypeDesc::U32 | TypeDesc::U64 | TypeDesc::Usize
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_signed()
            || self.is_unsigned()
            || matches!(self, TypeDesc::F32 | TypeDesc::F64 | TypeDesc::Decimal)
    }

    /// The element or value type of a sequence, mapping or optional.
    pub fn inner(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::Optional(t) | TypeDesc::Sequence(t) | TypeDesc::Mapping(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Bool => write!(f, "bool"),
            TypeDesc::I8 => write!(f, "i8"),
            TypeDesc::I16 => write!(f, "i16"),
            TypeDesc::I32 => write!(f, "i32"),
            TypeDesc::I64 => write!(f, "i64"),
            TypeDesc::Isize => write!(f, "isize"),
            TypeDesc::U8 => write!(f, "u8"),
            TypeDesc::U16 => write!(f, "u16"),
            TypeDesc::U32 => write!(f, "u32"),
            TypeDesc::U64 => write!(f, "u64"),
            TypeDesc::Usize => write!(f, "usize"),
            TypeDesc::F32 => write!(f, "f32"),
            TypeDesc::F64 => write!(f, "f64"),
            TypeDesc::Decimal => write!(f, "decimal"),
            TypeDesc::String => write!(f, "string"),
            TypeDesc::Timestamp => write!(f, "timestamp"),
            TypeDesc::Duration => write!(f, "duration"),
            TypeDesc::Any => write!(f, "any"),
            TypeDesc::Optional(t) => write!(f, "optional {}", t),
            TypeDesc::Sequence(t) => write!(f, "sequence of {}", t),
            TypeDesc::Mapping(t) => write!(f, "map of string to {}", t),
            TypeDesc::Record(name) => write!(f, "{}", name),
            TypeDesc::Error => write!(f, "error"),
            TypeDesc::Named(name) => write!(f, "{}", name),
        }
    }
}
