use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::Key,
    serialize::deserialize,
    traits::EntityKind,
};
use derive_more::{Deref, DerefMut};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// DataStore
///
/// Ordered map of primary key to encoded row for one entity kind.
///

#[derive(Debug, Default, Deref, DerefMut)]
pub struct DataStore(BTreeMap<Key, RawRow>);

impl DataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of bytes used by all stored rows.
    #[must_use]
    pub fn memory_bytes(&self) -> u64 {
        self.values().map(|row| row.len() as u64).sum()
    }
}

///
/// RawRowError
///

#[derive(Debug, ThisError)]
pub enum RawRowError {
    #[error("row exceeds max size: {len} bytes (limit {max})")]
    TooLarge { len: usize, max: usize },
}

impl RawRowError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Unsupported
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Store
    }
}

impl From<RawRowError> for InternalError {
    fn from(err: RawRowError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// RowDecodeError
///

#[derive(Debug, ThisError)]
pub enum RowDecodeError {
    #[error("row exceeds max size: {len} bytes (limit {max})")]
    TooLarge { len: usize, max: usize },

    #[error("row failed to deserialize: {0}")]
    Deserialize(String),
}

///
/// RawRow
///
/// Encoded entity row. Only persisted columns are present: inverse
/// references and derived parent references are rebuilt on read.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawRow(Vec<u8>);

impl RawRow {
    pub fn try_new(bytes: Vec<u8>, max_bytes: usize) -> Result<Self, RawRowError> {
        if bytes.len() > max_bytes {
            return Err(RawRowError::TooLarge {
                len: bytes.len(),
                max: max_bytes,
            });
        }

        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn try_decode<E: EntityKind>(&self, max_bytes: usize) -> Result<E, RowDecodeError> {
        if self.0.len() > max_bytes {
            return Err(RowDecodeError::TooLarge {
                len: self.0.len(),
                max: max_bytes,
            });
        }

        deserialize::<E>(&self.0, max_bytes)
            .map_err(|err| RowDecodeError::Deserialize(err.to_string()))
    }
}
