//! Descriptor build options.

use serde::{Deserialize, Serialize};

/// Options fixed into a descriptor when its field plans are built.
///
/// Descriptors are cached per `(record type, Options)`, so two call sites
/// using different options never share field plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// A required field missing from a document is an error. When disabled,
    /// missing fields are tolerated and declaring a default is a
    /// configuration error.
    pub strict_missing_fields: bool,
    /// Document keys that match no field are reported as errors.
    pub deny_unknown_fields: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            strict_missing_fields: true,
            deny_unknown_fields: false,
        }
    }
}

impl Options {
    pub fn strict() -> Self {
        Options::default()
    }

    pub fn relaxed() -> Self {
        Options {
            strict_missing_fields: false,
            ..Options::default()
        }
    }

    pub fn deny_unknown_fields(mut self, deny: bool) -> Self {
        self.deny_unknown_fields = deny;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let options = Options::default();
        assert!(options.strict_missing_fields);
        assert!(!options.deny_unknown_fields);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let options: Options =
            serde_json::from_value(serde_json::json!({"deny_unknown_fields": true})).unwrap();
        assert_eq!(options, Options::strict().deny_unknown_fields(true));

        let options: Options =
            serde_json::from_value(serde_json::json!({"strict_missing_fields": false})).unwrap();
        assert_eq!(options, Options::relaxed());
    }
}
