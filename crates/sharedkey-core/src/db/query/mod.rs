//! Module: query
//! Responsibility: typed load queries by primary key and the textual query
//! front end that lowers onto them.
//! Does not own: relation attachment rules or row encoding.
//! Boundary: loads only; writes go through a unit of work.

mod load;
mod parse;

#[cfg(test)]
mod tests;

pub use parse::{KeyFilter, TextQuery, parse_query};

pub(crate) use load::execute_load;

use crate::{
    db::{ReadConsistency, response::Response, session::DbSession},
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::{Key, KeyKind},
    model::EntityModel,
    traits::EntityKind,
};
use std::marker::PhantomData;
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,

    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("query ended early, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unterminated text literal starting at offset {offset}")]
    UnterminatedText { offset: usize },

    #[error("invalid character '{found}' at offset {offset}")]
    InvalidCharacter { found: char, offset: usize },

    #[error("integer literal '{literal}' is out of range")]
    IntegerOverflow { literal: String },

    #[error("query targets '{found}' but was run for '{expected}'")]
    EntityMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("entity '{entity}' has no field '{field}'")]
    UnknownField { entity: &'static str, field: String },

    #[error("only primary key '{key}' of '{entity}' can be filtered, found '{field}'")]
    NonKeyFilter {
        entity: &'static str,
        key: &'static str,
        field: String,
    },

    #[error("key {literal} does not match the {kind} key of '{entity}'")]
    KeyKindMismatch {
        entity: &'static str,
        kind: KeyKind,
        literal: Key,
    },
}

impl From<QueryError> for InternalError {
    fn from(err: QueryError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Query, err.to_string())
    }
}

///
/// Access
///
/// Row selection of a load.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Access {
    #[default]
    All,
    Key(Key),
    Keys(Vec<Key>),
}

impl Access {
    /// Lower a parsed textual query onto an access path for `model`.
    pub fn from_text(model: &EntityModel, query: &TextQuery) -> Result<Self, QueryError> {
        let named = query.entity == model.entity_name || query.entity == model.path;
        if !named {
            return Err(QueryError::EntityMismatch {
                expected: model.entity_name,
                found: query.entity.clone(),
            });
        }

        let Some(filter) = &query.filter else {
            return Ok(Self::All);
        };

        if model.field(&filter.field).is_none() {
            return Err(QueryError::UnknownField {
                entity: model.path,
                field: filter.field.clone(),
            });
        }
        if filter.field != model.primary_key {
            return Err(QueryError::NonKeyFilter {
                entity: model.path,
                key: model.primary_key,
                field: filter.field.clone(),
            });
        }
        check_key_kind(model, &filter.value)?;

        Ok(Self::Key(filter.value.clone()))
    }

    fn keys(&self) -> &[Key] {
        match self {
            Self::All => &[],
            Self::Key(key) => std::slice::from_ref(key),
            Self::Keys(keys) => keys,
        }
    }
}

pub(crate) fn check_key_kind(model: &EntityModel, key: &Key) -> Result<(), QueryError> {
    match model.key_kind() {
        Some(kind) if !key.matches_kind(kind) => Err(QueryError::KeyKindMismatch {
            entity: model.path,
            kind,
            literal: key.clone(),
        }),
        _ => Ok(()),
    }
}

///
/// LoadQuery
///
/// Typed load of `E` rows, with relations attached.
///

#[must_use]
pub struct LoadQuery<'a, E: EntityKind> {
    session: &'a DbSession,
    access: Access,
    consistency: Option<ReadConsistency>,
    _marker: PhantomData<E>,
}

impl<'a, E: EntityKind> LoadQuery<'a, E> {
    pub(crate) const fn new(session: &'a DbSession) -> Self {
        Self {
            session,
            access: Access::All,
            consistency: None,
            _marker: PhantomData,
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.access = Access::Key(key.into());
        self
    }

    pub fn keys<K: Into<Key>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.access = Access::Keys(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn all(mut self) -> Self {
        self.access = Access::All;
        self
    }

    /// Override the session's read consistency for this load.
    pub const fn consistency(mut self, consistency: ReadConsistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    #[must_use]
    pub const fn access(&self) -> &Access {
        &self.access
    }

    pub fn execute(self) -> Result<Response<E>, InternalError> {
        let consistency = self
            .consistency
            .unwrap_or_else(|| self.session.read_consistency());

        self.session.execute_load(&self.access, consistency)
    }
}
