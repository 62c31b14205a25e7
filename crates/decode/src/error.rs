//! Configuration errors and per-document field errors.
//!
//! Configuration errors come from a malformed record description and are
//! raised once, while field plans are built. Field errors come from a
//! document and accumulate: one document can report many of them.

use std::fmt;

use sieve_core::{TagError, TypeDesc};

// ──────────────────────────────────────────────
// Configuration errors
// ──────────────────────────────────────────────

/// A mistake in a record description, found while building field plans.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{record}.{field}: {source}")]
    Tag {
        record: String,
        field: String,
        #[source]
        source: TagError,
    },

    #[error("{record}.{field}: default declared while strict missing-field handling is disabled")]
    DefaultWithoutStrict { record: String, field: String },

    #[error("{record}.{field}: default and default_fn are mutually exclusive")]
    ConflictingDefaults { record: String, field: String },

    #[error("{record}.{field}: two fields use the wire name '{name}'")]
    DuplicateField {
        record: String,
        field: String,
        name: String,
    },

    #[error("{record}.{field}: default_fn {method}: method not found")]
    MethodNotFound {
        record: String,
        field: String,
        method: String,
    },

    #[error("{record}.{field}: default_fn {method}: takes {count} arguments, expected none")]
    MethodArguments {
        record: String,
        field: String,
        method: String,
        count: usize,
    },

    #[error("{record}.{field}: default_fn {method}: returns {count} values, expected 2 (value, error)")]
    MethodReturnArity {
        record: String,
        field: String,
        method: String,
        count: usize,
    },

    #[error("{record}.{field}: default_fn {method}: first return value is {found}, expected {expected}")]
    MethodReturnType {
        record: String,
        field: String,
        method: String,
        expected: TypeDesc,
        found: TypeDesc,
    },

    #[error("{record}.{field}: default_fn {method}: second return value is {found}, expected an error")]
    MethodErrorReturn {
        record: String,
        field: String,
        method: String,
        found: TypeDesc,
    },

    #[error("{record}.{field}: default_fn {method}: method is declared but has no body")]
    MethodNotInvocable {
        record: String,
        field: String,
        method: String,
    },

    #[error("descriptor cache entry for {record} holds a different record type")]
    CacheTypeMismatch { record: String },
}

// ──────────────────────────────────────────────
// Coercion errors
// ──────────────────────────────────────────────

/// Why an input value could not be stored in a destination slot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: TypeDesc,
        got: &'static str,
    },

    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: TypeDesc },

    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp { input: String, reason: String },

    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    /// A nested record's descriptor could not be built.
    #[error(transparent)]
    Config(ConfigError),

    /// Errors found inside a sequence, mapping or nested record.
    #[error("{0}")]
    Nested(FieldErrors),
}

impl CoercionError {
    /// Attach this error to `at`, flattening nested errors under it.
    pub fn into_field_errors(self, at: Path) -> FieldErrors {
        match self {
            CoercionError::Nested(inner) => inner
                .into_iter()
                .map(|e| FieldError {
                    path: at.join(&e.path),
                    kind: e.kind,
                })
                .collect(),
            other => FieldErrors::single(FieldError::new(at, FieldErrorKind::Coercion(other))),
        }
    }
}

// ──────────────────────────────────────────────
// Paths
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Location of a value inside a document, e.g. `servers[2].ports[web]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Path(vec![Segment::Field(name.into())])
    }

    pub fn index(i: usize) -> Self {
        Path(vec![Segment::Index(i)])
    }

    pub fn key(key: impl Into<String>) -> Self {
        Path(vec![Segment::Key(key.into())])
    }

    pub fn join(&self, tail: &Path) -> Path {
        let mut segments = self.0.clone();
        segments.extend(tail.0.iter().cloned());
        Path(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Field errors
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldErrorKind {
    #[error("is required")]
    Required,

    #[error(transparent)]
    Coercion(CoercionError),

    #[error("default_fn {method} failed: {message}")]
    ComputedDefault { method: String, message: String },

    #[error("unknown field")]
    UnknownField,
}

/// A single violation found in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub path: Path,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(path: Path, kind: FieldErrorKind) -> Self {
        FieldError { path, kind }
    }

    /// The violation without its location, e.g. `is required`.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

impl std::error::Error for FieldError {}

/// Every violation found in one document, in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors(Vec::new())
    }

    pub fn single(error: FieldError) -> Self {
        FieldErrors(vec![error])
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// The first error reported at `path`, if any.
    pub fn at(&self, path: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.path.to_string() == path)
    }
}

impl Extend<FieldError> for FieldErrors {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<FieldError> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        FieldErrors(iter.into_iter().collect())
    }
}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}
