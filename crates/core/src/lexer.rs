//! Tokenizer for constraint tag strings.
//!
//! A tag is a comma-separated list of tokens. Each token is one of:
//! - a bare keyword (`required`)
//! - a `key=value` or `key:value` pair (the value may hold `|` alternatives)
//! - a bare `|`-joined alternation (`email|url`)
//!
//! Whitespace around delimiters is trimmed and empty tokens are skipped.

/// Key under which a bare alternation token is stored.
pub const OR_KEY: &str = "or";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare keyword such as `required` or `dive`.
    Word(String),
    /// A `key=value` or `key:value` pair.
    Pair { key: String, value: String },
    /// A bare `a|b|c` alternation.
    Alternation(String),
}

impl Token {
    /// The constraint name this token contributes to a constraint set.
    pub fn key(&self) -> &str {
        match self {
            Token::Word(w) => w,
            Token::Pair { key, .. } => key,
            Token::Alternation(_) => OR_KEY,
        }
    }

    /// The textual argument, empty for keywords.
    pub fn value(&self) -> &str {
        match self {
            Token::Word(_) => "",
            Token::Pair { value, .. } => value,
            Token::Alternation(alts) => alts,
        }
    }

    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(w) if w == word)
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    /// Zero-based index of the token among the non-empty tokens of the tag.
    pub position: usize,
}

pub fn lex(tag: &str) -> Vec<Spanned> {
    tag.split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .enumerate()
        .map(|(position, raw)| Spanned {
            token: lex_token(raw),
            position,
        })
        .collect()
}

fn lex_token(raw: &str) -> Token {
    // The earliest of '=' and ':' separates key from value, so a value may
    // itself contain the other delimiter (`default=12:30`, `pattern:^a=b$`).
    let split = raw
        .char_indices()
        .find(|(_, c)| *c == '=' || *c == ':')
        .map(|(i, _)| i);

    match split {
        Some(i) => Token::Pair {
            key: raw[..i].trim().to_string(),
            value: raw[i + 1..].trim().to_string(),
        },
        None if raw.contains('|') => Token::Alternation(
            raw.split('|')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("|"),
        ),
        None => Token::Word(raw.to_string()),
    }
}
