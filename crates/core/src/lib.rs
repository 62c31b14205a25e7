//! sieve-core: constraint tags and declared types.
//!
//! The type-agnostic half of sieve. It knows nothing about records or
//! documents; it parses the constraint tags attached to record fields and
//! names the shapes those fields can take. The decoding engine
//! (`sieve-decode`) and schema projections both read these types.
//!
//! - [`parse_tag`] / [`parse_tag_scoped`] -- tag grammar
//! - [`ConstraintSet`], [`ParsedTag`] -- parsed constraints
//! - [`TypeDesc`] -- declared field types
//! - [`TagError`] -- malformed tag scoping

pub mod error;
pub mod lexer;
pub mod tags;
pub mod types;

pub use error::TagError;
pub use tags::{parse_tag, parse_tag_scoped, ConstraintSet, ParsedTag};
pub use types::TypeDesc;
