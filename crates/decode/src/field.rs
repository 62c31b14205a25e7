//! The [`Field`] trait: a typed slot that untyped values can be coerced into.
//!
//! Scalar, time and duration impls live in [`crate::coerce`]. This module
//! holds the structural ones: optionals, sequences, mappings, untyped
//! passthrough values and nested records.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};
use sieve_core::TypeDesc;

use crate::cache;
use crate::coerce::{mismatch, Coercer};
use crate::defaults::assign_or_skip;
use crate::error::{CoercionError, ConfigError, FieldErrors, Path};
use crate::options::Options;
use crate::schema::{record_name, Record};

/// Record types already visited while preparing nested descriptors.
pub type Seen = HashSet<TypeId>;

/// A destination slot type.
pub trait Field: Sized + Send + Sync + 'static {
    /// The zero value a fresh slot starts from.
    fn zero() -> Self;

    fn type_desc() -> TypeDesc;

    /// Store `input` in this slot, or explain why it cannot be stored.
    fn coerce(&mut self, input: &Value, cx: &Coercer<'_>) -> Result<(), CoercionError>;

    /// Parse and assign a textual default. Never fails: an unparseable
    /// default leaves the slot as it was. Slots without a textual form
    /// ignore defaults.
    fn apply_default(&mut self, _text: &str) {}

    /// Build the descriptors of any records reachable through this type.
    fn prepare(_options: &Options, _seen: &mut Seen) -> Result<(), ConfigError> {
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Optional
// ──────────────────────────────────────────────

/// Null unsets the slot; anything else allocates and recurses.
impl<T: Field> Field for Option<T> {
    fn zero() -> Self {
        None
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::Optional(Box::new(T::type_desc()))
    }

    fn coerce(&mut self, input: &Value, cx: &Coercer<'_>) -> Result<(), CoercionError> {
        if input.is_null() {
            *self = None;
            return Ok(());
        }
        let inner = self.insert(T::zero());
        inner.coerce(input, cx)
    }

    fn apply_default(&mut self, text: &str) {
        self.insert(T::zero()).apply_default(text);
    }

    fn prepare(options: &Options, seen: &mut Seen) -> Result<(), ConfigError> {
        T::prepare(options, seen)
    }
}

// ──────────────────────────────────────────────
// Sequences and mappings
// ──────────────────────────────────────────────

/// Coerce every element, keeping failed elements at their partial value so
/// the output length always matches the input.
fn coerce_elements<T: Field>(items: &[Value], cx: &Coercer<'_>) -> (Vec<T>, FieldErrors) {
    let mut out = Vec::with_capacity(items.len());
    let mut errors = FieldErrors::new();
    for (i, item) in items.iter().enumerate() {
        let mut element = T::zero();
        if let Err(e) = element.coerce(item, cx) {
            errors.extend(e.into_field_errors(Path::index(i)));
        }
        out.push(element);
    }
    (out, errors)
}

fn coerce_entries<T: Field>(
    entries: &Map<String, Value>,
    cx: &Coercer<'_>,
) -> (Vec<(String, T)>, FieldErrors) {
    let mut out = Vec::with_capacity(entries.len());
    let mut errors = FieldErrors::new();
    for (key, item) in entries {
        let mut value = T::zero();
        if let Err(e) = value.coerce(item, cx) {
            errors.extend(e.into_field_errors(Path::key(key.as_str())));
        }
        out.push((key.clone(), value));
    }
    (out, errors)
}

fn nested(errors: FieldErrors) -> Result<(), CoercionError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoercionError::Nested(errors))
    }
}

impl<T: Field> Field for Vec<T> {
    fn zero() -> Self {
        Vec::new()
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::Sequence(Box::new(T::type_desc()))
    }

    fn coerce(&mut self, input: &Value, cx: &Coercer<'_>) -> Result<(), CoercionError> {
        match input {
            Value::Null => {
                *self = Vec::new();
                Ok(())
            }
            Value::Array(items) => {
                let (elements, errors) = coerce_elements(items, cx);
                *self = elements;
                nested(errors)
            }
            other => Err(mismatch(Self::type_desc(), other)),
        }
    }

    fn prepare(options: &Options, seen: &mut Seen) -> Result<(), ConfigError> {
        T::prepare(options, seen)
    }
}

macro_rules! mapping_field {
    ($($map:ident),*) => {$(
        /// Keys are taken verbatim; values are coerced.
        impl<T: Field> Field for $map<String, T> {
            fn zero() -> Self {
                $map::new()
            }

            fn type_desc() -> TypeDesc {
                TypeDesc::Mapping(Box::new(T::type_desc()))
            }

            fn coerce(&mut self, input: &Value, cx: &Coercer<'_>) -> Result<(), CoercionError> {
                match input {
                    Value::Null => {
                        *self = $map::new();
                        Ok(())
                    }
                    Value::Object(entries) => {
                        let (values, errors) = coerce_entries(entries, cx);
                        *self = values.into_iter().collect();
                        nested(errors)
                    }
                    other => Err(mismatch(Self::type_desc(), other)),
                }
            }

            fn prepare(options: &Options, seen: &mut Seen) -> Result<(), ConfigError> {
                T::prepare(options, seen)
            }
        }
    )*};
}

mapping_field!(BTreeMap, HashMap);

// ──────────────────────────────────────────────
// Untyped passthrough
// ──────────────────────────────────────────────

impl Field for Value {
    fn zero() -> Self {
        Value::Null
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::Any
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        *self = input.clone();
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        assign_or_skip(self, text, serde_json::from_str(text).ok());
    }
}

// ──────────────────────────────────────────────
// Boxes
// ──────────────────────────────────────────────

/// A box is transparent: it holds and coerces exactly like its contents.
/// `Option<Box<R>>` is the shape of a self-referential record.
impl<T: Field> Field for Box<T> {
    fn zero() -> Self {
        Box::new(T::zero())
    }

    fn type_desc() -> TypeDesc {
        T::type_desc()
    }

    fn coerce(&mut self, input: &Value, cx: &Coercer<'_>) -> Result<(), CoercionError> {
        (**self).coerce(input, cx)
    }

    fn apply_default(&mut self, text: &str) {
        (**self).apply_default(text);
    }

    fn prepare(options: &Options, seen: &mut Seen) -> Result<(), ConfigError> {
        T::prepare(options, seen)
    }
}

// ──────────────────────────────────────────────
// Nested records
// ──────────────────────────────────────────────

/// The [`Field`] behavior shared by every record type, used by
/// [`record_field!`](crate::record_field).
///
/// A nested record resolves each of its fields through its own descriptor.
#[doc(hidden)]
pub mod record {
    use super::*;

    pub fn type_desc<R: Record>() -> TypeDesc {
        TypeDesc::Record(record_name::<R>().to_string())
    }

    pub fn coerce<R: Record>(
        slot: &mut R,
        input: &Value,
        cx: &Coercer<'_>,
    ) -> Result<(), CoercionError> {
        match input {
            Value::Null => {
                *slot = R::default();
                Ok(())
            }
            Value::Object(doc) => {
                let descriptor = cx.descriptor::<R>().map_err(CoercionError::Config)?;
                nested(descriptor.apply(slot, doc, cx))
            }
            other => Err(mismatch(type_desc::<R>(), other)),
        }
    }

    pub fn prepare<R: Record>(options: &Options, seen: &mut Seen) -> Result<(), ConfigError> {
        cache::prepare::<R>(options, seen)
    }
}

/// Implement [`Field`] for record types so they can be nested inside other
/// records, sequences, mappings, options and boxes.
///
/// ```
/// use sieve_decode::{record_field, Record, Schema};
///
/// #[derive(Default)]
/// struct Link {
///     value: i32,
///     next: Option<Box<Link>>,
/// }
///
/// impl Record for Link {
///     fn describe(schema: &mut Schema<Self>) {
///         schema.field("Value", |l| &mut l.value).rename("value");
///         schema.field("Next", |l| &mut l.next).rename("next");
///     }
/// }
///
/// record_field!(Link);
/// ```
#[macro_export]
macro_rules! record_field {
    ($($record:ty),+ $(,)?) => {$(
        impl $crate::Field for $record {
            fn zero() -> Self {
                <$record as ::core::default::Default>::default()
            }

            fn type_desc() -> $crate::TypeDesc {
                $crate::field::record::type_desc::<$record>()
            }

            fn coerce(
                &mut self,
                input: &$crate::serde_json::Value,
                cx: &$crate::Coercer<'_>,
            ) -> ::core::result::Result<(), $crate::CoercionError> {
                $crate::field::record::coerce(self, input, cx)
            }

            fn prepare(
                options: &$crate::Options,
                seen: &mut $crate::field::Seen,
            ) -> ::core::result::Result<(), $crate::ConfigError> {
                $crate::field::record::prepare::<$record>(options, seen)
            }
        }
    )+};
}
