//! Per-field presence in a document.

use serde_json::{Map, Value};

/// Whether a field was absent, explicitly null, or present with a value.
///
/// Required-field and default handling only fire on [`Presence::Absent`];
/// an explicit null or an explicit zero value is always coerced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence<'a> {
    Absent,
    Null,
    Present(&'a Value),
}

impl<'a> Presence<'a> {
    /// Look up `key` in a document object.
    pub fn lookup(doc: &'a Map<String, Value>, key: &str) -> Self {
        Presence::from_option(doc.get(key))
    }

    pub fn from_option(value: Option<&'a Value>) -> Self {
        match value {
            None => Presence::Absent,
            Some(Value::Null) => Presence::Null,
            Some(value) => Presence::Present(value),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }
}
