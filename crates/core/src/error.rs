/// A malformed constraint tag. Always a programming mistake in a type
/// definition, never a property of a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// `keys` appeared while not directly inside a `dive` scope.
    #[error("keys can only appear after dive (token {position})")]
    KeysOutsideDive { position: usize },

    /// `endkeys` appeared without an open `keys` scope.
    #[error("endkeys can only appear after keys (token {position})")]
    EndKeysWithoutKeys { position: usize },

    /// The tag ended while a `keys` scope was still open.
    #[error("keys must be closed by endkeys (opened at token {position})")]
    UnclosedKeys { position: usize },
}
