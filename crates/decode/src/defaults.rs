//! Textual default values.
//!
//! A static default is parsed with the natural text form of its slot's type
//! and assigned on success. An unparseable default leaves the slot untouched
//! and raises no error; it is only logged.

use std::str::FromStr;

/// Parse a boolean default: `true`/`false`/`1`/`0` and their common
/// spellings.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Assign `parsed` to `slot` if present, otherwise log and leave it as is.
pub(crate) fn assign_or_skip<T>(slot: &mut T, text: &str, parsed: Option<T>) {
    match parsed {
        Some(value) => *slot = value,
        None => tracing::debug!(
            default = text,
            target_type = std::any::type_name::<T>(),
            "ignoring unparseable default"
        ),
    }
}

/// Assign a default parsed with `FromStr`.
pub(crate) fn assign_parsed<T: FromStr>(slot: &mut T, text: &str) {
    assign_or_skip(slot, text, text.parse::<T>().ok());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn unparseable_leaves_slot() {
        let mut port: u16 = 0;
        assign_parsed(&mut port, "eighty");
        assert_eq!(port, 0);
        assign_parsed(&mut port, "8080");
        assert_eq!(port, 8080);
        assign_parsed(&mut port, "70000");
        assert_eq!(port, 8080);
    }

    #[test]
    fn float_default() {
        let mut ratio = 0.0f64;
        assign_parsed(&mut ratio, "0.75");
        assert_eq!(ratio, 0.75);
    }
}
