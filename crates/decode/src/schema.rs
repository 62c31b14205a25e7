//! Explicit record descriptions.
//!
//! A record type lists its fields and the methods usable as computed
//! defaults by implementing [`Record::describe`]:
//!
//! ```
//! use sieve_decode::{Method, Record, Schema};
//!
//! #[derive(Default)]
//! struct Listener {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Listener {
//!     fn default_host(&self) -> Result<String, std::io::Error> {
//!         Ok("localhost".to_string())
//!     }
//! }
//!
//! impl Record for Listener {
//!     fn describe(schema: &mut Schema<Self>) {
//!         schema.field("Host", |l| &mut l.host).rename("host").tag("default_fn=DefaultHost");
//!         schema.field("Port", |l| &mut l.port).rename("port").tag("required");
//!         schema.method(Method::fallible("DefaultHost", Listener::default_host));
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use sieve_core::TypeDesc;

use crate::coerce::Coercer;
use crate::error::{CoercionError, ConfigError};
use crate::field::{Field, Seen};
use crate::options::Options;

/// Rename value that excludes a field from decoding.
pub const IGNORE: &str = "-";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A record type whose fields are decoded from a document object.
pub trait Record: Default + Send + Sync + 'static {
    fn describe(schema: &mut Schema<Self>);
}

/// Short type name for diagnostics (`app::config::Listener` -> `Listener`).
pub(crate) fn record_name<R>() -> &'static str {
    let full = std::any::type_name::<R>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

// ──────────────────────────────────────────────
// Field access
// ──────────────────────────────────────────────

/// Type-erased access to one field of `R`.
pub(crate) trait Access<R>: Send + Sync {
    fn coerce(&self, record: &mut R, input: &Value, cx: &Coercer<'_>) -> Result<(), CoercionError>;
    fn apply_default(&self, record: &mut R, text: &str);
    /// Store a value produced by a computed default. Hands the value back if
    /// it is not of the field's type.
    fn assign(&self, record: &mut R, value: Box<dyn Any + Send>) -> Result<(), Box<dyn Any + Send>>;
    fn type_desc(&self) -> TypeDesc;
    fn slot_id(&self) -> TypeId;
    fn prepare(&self, options: &Options, seen: &mut Seen) -> Result<(), ConfigError>;
}

struct Projection<R, T> {
    get: fn(&mut R) -> &mut T,
}

impl<R: 'static, T: Field> Access<R> for Projection<R, T> {
    fn coerce(&self, record: &mut R, input: &Value, cx: &Coercer<'_>) -> Result<(), CoercionError> {
        (self.get)(record).coerce(input, cx)
    }

    fn apply_default(&self, record: &mut R, text: &str) {
        (self.get)(record).apply_default(text);
    }

    fn assign(&self, record: &mut R, value: Box<dyn Any + Send>) -> Result<(), Box<dyn Any + Send>> {
        *(self.get)(record) = *value.downcast::<T>()?;
        Ok(())
    }

    fn type_desc(&self) -> TypeDesc {
        T::type_desc()
    }

    fn slot_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn prepare(&self, options: &Options, seen: &mut Seen) -> Result<(), ConfigError> {
        T::prepare(options, seen)
    }
}

// ──────────────────────────────────────────────
// Schema
// ──────────────────────────────────────────────

/// The fields and methods of one record type.
pub struct Schema<R> {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<FieldDecl<R>>,
    pub(crate) methods: Vec<Method<R>>,
}

impl<R: Record> Schema<R> {
    pub(crate) fn collect() -> Self {
        let mut schema = Schema {
            name: record_name::<R>(),
            fields: Vec::new(),
            methods: Vec::new(),
        };
        R::describe(&mut schema);
        schema
    }

    /// Declare a public field. `name` is the field's own name, used as the
    /// wire name unless renamed.
    pub fn field<T: Field>(&mut self, name: &'static str, get: fn(&mut R) -> &mut T) -> &mut FieldDecl<R> {
        let index = self.fields.len();
        self.fields.push(FieldDecl {
            name,
            rename: None,
            tag: None,
            access: Box::new(Projection { get }),
        });
        &mut self.fields[index]
    }

    /// Declare a method that field tags may name in `default_fn`.
    pub fn method(&mut self, method: Method<R>) -> &mut Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// One declared field.
pub struct FieldDecl<R> {
    pub(crate) name: &'static str,
    pub(crate) rename: Option<String>,
    pub(crate) tag: Option<String>,
    pub(crate) access: Box<dyn Access<R>>,
}

impl<R> FieldDecl<R> {
    /// Set the wire name. Only the text before the first `,` counts; an
    /// empty name keeps the field's own name and `-` excludes the field.
    pub fn rename(&mut self, rename: impl Into<String>) -> &mut Self {
        self.rename = Some(rename.into());
        self
    }

    /// Attach a constraint tag such as `required,default=8080`.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    /// The name used in documents, or `None` if the field is excluded.
    pub(crate) fn wire_name(&self) -> Option<String> {
        let Some(rename) = self.rename.as_deref() else {
            return Some(self.name.to_string());
        };
        if rename == IGNORE {
            return None;
        }
        let name = rename.split(',').next().unwrap_or_default().trim();
        if name.is_empty() {
            Some(self.name.to_string())
        } else {
            Some(name.to_string())
        }
    }
}

// ──────────────────────────────────────────────
// Methods
// ──────────────────────────────────────────────

/// A parameter or return type in a method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigType {
    Value { id: TypeId, desc: TypeDesc },
    Error,
}

impl SigType {
    pub fn of<T: Field>() -> Self {
        SigType::Value {
            id: TypeId::of::<T>(),
            desc: T::type_desc(),
        }
    }

    /// Any type, described by its Rust type name.
    pub fn named<T: 'static>() -> Self {
        SigType::Value {
            id: TypeId::of::<T>(),
            desc: TypeDesc::Named(std::any::type_name::<T>().to_string()),
        }
    }

    pub fn desc(&self) -> TypeDesc {
        match self {
            SigType::Value { desc, .. } => desc.clone(),
            SigType::Error => TypeDesc::Error,
        }
    }
}

/// Parameters (beyond the receiver) and return values of a method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSig {
    pub params: Vec<SigType>,
    pub returns: Vec<SigType>,
}

impl MethodSig {
    pub fn new() -> Self {
        MethodSig::default()
    }

    pub fn param<T: 'static>(mut self) -> Self {
        self.params.push(SigType::named::<T>());
        self
    }

    pub fn returns<T: Field>(mut self) -> Self {
        self.returns.push(SigType::of::<T>());
        self
    }

    /// A return value of a type that is not a field type.
    pub fn returns_named<T: 'static>(mut self) -> Self {
        self.returns.push(SigType::named::<T>());
        self
    }

    pub fn returns_error(mut self) -> Self {
        self.returns.push(SigType::Error);
        self
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |types: &[SigType]| {
            types
                .iter()
                .map(|t| t.desc().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "({}) -> ({})", list(&self.params), list(&self.returns))
    }
}

pub(crate) type Invoke<R> =
    Arc<dyn Fn(&R) -> Result<Box<dyn Any + Send>, BoxError> + Send + Sync>;

/// A method of `R`, described by its signature.
pub struct Method<R> {
    pub(crate) name: &'static str,
    pub(crate) sig: MethodSig,
    pub(crate) call: Option<Invoke<R>>,
}

impl<R: 'static> Method<R> {
    /// A zero-argument method returning a value or an error: the shape a
    /// computed default needs.
    pub fn fallible<T, E>(name: &'static str, f: fn(&R) -> Result<T, E>) -> Self
    where
        T: Field,
        E: Into<BoxError> + 'static,
    {
        Method {
            name,
            sig: MethodSig::new().returns::<T>().returns_error(),
            call: Some(Arc::new(move |record: &R| {
                f(record)
                    .map(|value| Box::new(value) as Box<dyn Any + Send>)
                    .map_err(Into::into)
            })),
        }
    }

    /// A method known only by its signature. It cannot be invoked, so it
    /// only ever fails computed-default validation.
    pub fn declared(name: &'static str, sig: MethodSig) -> Self {
        Method {
            name,
            sig,
            call: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn sig(&self) -> &MethodSig {
        &self.sig
    }
}
