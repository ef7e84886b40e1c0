use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::Key,
    traits::EntityKind,
};
use derive_more::IntoIterator;
use thiserror::Error as ThisError;

///
/// ResponseError
///

#[derive(Debug, ThisError)]
pub enum ResponseError {
    #[error("expected one row of '{entity}', found none")]
    NotFound { entity: &'static str },

    #[error("expected one row of '{entity}', found {count}")]
    NotUnique { entity: &'static str, count: usize },
}

impl ResponseError {
    const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::NotUnique { .. } => ErrorClass::Conflict,
        }
    }
}

impl From<ResponseError> for InternalError {
    fn from(err: ResponseError) -> Self {
        Self::new(err.class(), ErrorOrigin::Response, err.to_string())
    }
}

///
/// Response
///
/// Materialized rows of a load, in key order for full scans and in request
/// order for key loads.
///

#[derive(Debug, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct Response<E: EntityKind>(Vec<(Key, E)>);

impl<E: EntityKind> Response<E> {
    #[must_use]
    pub(crate) const fn new(rows: Vec<(Key, E)>) -> Self {
        Self(rows)
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Require exactly one row.
    pub fn require_one(&self) -> Result<(), InternalError> {
        match self.count() {
            1 => Ok(()),
            0 => Err(ResponseError::NotFound { entity: E::PATH }.into()),
            count => Err(ResponseError::NotUnique {
                entity: E::PATH,
                count,
            }
            .into()),
        }
    }

    /// The single row's entity.
    pub fn entity(self) -> Result<E, InternalError> {
        self.require_one()?;

        self.try_entity()?
            .ok_or_else(|| ResponseError::NotFound { entity: E::PATH }.into())
    }

    /// The row's entity, if any. More than one row is an error.
    pub fn try_entity(self) -> Result<Option<E>, InternalError> {
        let count = self.count();
        if count > 1 {
            return Err(ResponseError::NotUnique {
                entity: E::PATH,
                count,
            }
            .into());
        }

        Ok(self.0.into_iter().next().map(|(_, entity)| entity))
    }

    #[must_use]
    pub fn entities(self) -> Vec<E> {
        self.0.into_iter().map(|(_, entity)| entity).collect()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.0.iter().map(|(key, _)| key.clone()).collect()
    }

    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Key, E)> {
        self.0.iter()
    }
}
