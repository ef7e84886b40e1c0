use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Key
///
/// Primary key value as stored and compared by the runtime.
/// A derived key is a verbatim copy of the parent's `Key`; no conversion
/// between variants ever happens.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Key {
    #[display("'{_0}'")]
    Text(String),

    #[display("{_0}")]
    Uint(u64),
}

impl Key {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub const fn uint(value: u64) -> Self {
        Self::Uint(value)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Uint(_) => None,
        }
    }

    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Whether this key is admissible for a field of the given key kind.
    #[must_use]
    pub const fn matches_kind(&self, kind: KeyKind) -> bool {
        matches!(
            (self, kind),
            (Self::Text(_), KeyKind::Text) | (Self::Uint(_), KeyKind::Uint)
        )
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

///
/// KeyKind
/// Declared primary key shape of an entity.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum KeyKind {
    #[display("text")]
    Text,

    #[display("uint")]
    Uint,
}

///
/// TESTS
///
