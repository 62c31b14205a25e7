//! Sieve decode: populate typed records from untyped JSON documents.
//!
//! A record type describes its fields and constraint tags through
//! [`Record`]. The first time a record type is used, its tags are parsed and
//! every computed-default binding is validated, producing a cached
//! [`Descriptor`]. Each document is then decoded field by field:
//!
//! - a present value (explicit null included) is coerced into the field's
//!   type, rejecting lossy or surprising conversions such as number to
//!   string;
//! - an absent field takes its static `default`, then its `default_fn`,
//!   and is otherwise reported as `is required` when marked so in strict
//!   mode.
//!
//! Records that nest inside other records also implement [`Field`] through
//! [`record_field!`].
//!
//! Document errors accumulate in [`FieldErrors`] next to a best-effort
//! record. Mistakes in a record description are [`ConfigError`]s returned
//! before any document is read.

pub mod cache;
pub mod coerce;
pub mod defaults;
pub mod duration;
pub mod error;
pub mod field;
pub mod options;
pub mod plan;
pub mod presence;
pub mod schema;

pub use cache::descriptor;
pub use coerce::Coercer;
pub use error::{CoercionError, ConfigError, FieldError, FieldErrorKind, FieldErrors, Path, Segment};
pub use field::Field;
pub use options::Options;
pub use plan::{build_field_plans, Descriptor, FieldPlan};
pub use presence::Presence;
pub use schema::{BoxError, FieldDecl, Method, MethodSig, Record, Schema, SigType};
#[doc(hidden)]
pub use serde_json;
pub use sieve_core::{parse_tag, parse_tag_scoped, ConstraintSet, ParsedTag, TagError, TypeDesc};

use serde_json::Value;

/// A decoded record and every violation found while decoding it.
///
/// `value` is always populated as far as the document allowed, even when
/// `errors` is not empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<R> {
    pub value: R,
    pub errors: FieldErrors,
}

impl<R> Decoded<R> {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The record if the document had no errors.
    pub fn into_result(self) -> Result<R, FieldErrors> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(self.errors)
        }
    }
}

/// Decode `doc` into a fresh `R`.
pub fn decode<R: Record>(doc: &Value, options: &Options) -> Result<Decoded<R>, ConfigError> {
    let mut value = R::default();
    let errors = decode_into(&mut value, doc, options)?;
    Ok(Decoded { value, errors })
}

/// Decode `doc` into an existing record, overwriting the fields the
/// document (or a default) provides.
pub fn decode_into<R: Record>(
    record: &mut R,
    doc: &Value,
    options: &Options,
) -> Result<FieldErrors, ConfigError> {
    let descriptor = descriptor::<R>(options)?;
    let cx = Coercer::new(options);
    let errors = match doc {
        Value::Object(map) => descriptor.apply(record, map, &cx),
        other => CoercionError::TypeMismatch {
            expected: field::record::type_desc::<R>(),
            got: coerce::SourceKind::of(other).name(),
        }
        .into_field_errors(Path::root()),
    };
    tracing::debug!(
        record = descriptor.record(),
        errors = errors.len(),
        "decoded document"
    );
    Ok(errors)
}
