//! Constraint tag parsing.
//!
//! [`parse_tag`] turns a tag into a flat [`ConstraintSet`].
//! [`parse_tag_scoped`] runs the scoping state machine and splits the
//! constraints into field-level, map-key-level and element-level sets:
//!
//! ```text
//! Collection --dive--> Dive --keys--> Keys --endkeys--> Element
//! ```
//!
//! Tokens seen in `Collection` describe the field itself, tokens seen in
//! `Dive` or `Element` describe each element, and tokens between `keys` and
//! `endkeys` describe each map key.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::TagError;
use crate::lexer::{lex, Spanned};

pub const DIVE: &str = "dive";
pub const KEYS: &str = "keys";
pub const END_KEYS: &str = "endkeys";

/// Constraint name to textual argument (empty for argument-less constraints).
/// Later duplicates overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConstraintSet(BTreeMap<String, String>);

impl ConstraintSet {
    pub fn new() -> Self {
        ConstraintSet(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, arg: impl Into<String>) {
        self.0.insert(name.into(), arg.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn absorb(&mut self, spanned: &Spanned) {
        self.insert(spanned.token.key(), spanned.token.value());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ConstraintSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Constraints split by the scope they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedTag {
    /// Constraints on the field itself (e.g. a sequence's length).
    pub collection: ConstraintSet,
    /// Constraints on each map key (`keys ... endkeys`).
    pub keys: ConstraintSet,
    /// Constraints on each element or map value (after `dive`).
    pub elements: ConstraintSet,
    pub dive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Collection,
    Dive,
    Keys { opened_at: usize },
    Element,
}

/// Parse a tag into a flat constraint set.
///
/// Returns `None` when no tag was declared at all, so callers can tell
/// "no constraints" apart from an empty declaration.
pub fn parse_tag(tag: Option<&str>) -> Option<ConstraintSet> {
    let tag = tag?;
    let mut set = ConstraintSet::new();
    for spanned in lex(tag) {
        set.absorb(&spanned);
    }
    Some(set)
}

/// Parse a tag with `dive` / `keys` / `endkeys` scoping.
///
/// Returns `Ok(None)` when no tag was declared. Malformed scoping is an
/// error.
pub fn parse_tag_scoped(tag: Option<&str>) -> Result<Option<ParsedTag>, TagError> {
    let Some(tag) = tag else {
        return Ok(None);
    };

    let mut parsed = ParsedTag::default();
    let mut scope = Scope::Collection;

    for spanned in lex(tag) {
        let token = &spanned.token;
        scope = match scope {
            Scope::Collection if token.is_word(DIVE) => {
                parsed.dive = true;
                Scope::Dive
            }
            Scope::Dive if token.is_word(KEYS) => Scope::Keys {
                opened_at: spanned.position,
            },
            Scope::Keys { .. } if token.is_word(END_KEYS) => Scope::Element,
            _ if token.is_word(KEYS) => {
                return Err(TagError::KeysOutsideDive {
                    position: spanned.position,
                })
            }
            _ if token.is_word(END_KEYS) => {
                return Err(TagError::EndKeysWithoutKeys {
                    position: spanned.position,
                })
            }
            Scope::Collection => {
                parsed.collection.absorb(&spanned);
                scope
            }
            Scope::Keys { .. } => {
                parsed.keys.absorb(&spanned);
                scope
            }
            // A nested `dive` after the first one stays an element-level
            // constraint so element validators can rescope.
            Scope::Dive | Scope::Element => {
                parsed.elements.absorb(&spanned);
                scope
            }
        };
    }

    if let Scope::Keys { opened_at } = scope {
        return Err(TagError::UnclosedKeys {
            position: opened_at,
        });
    }

    Ok(Some(parsed))
}
