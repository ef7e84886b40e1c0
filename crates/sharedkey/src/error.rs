use derive_more::Display;
use serde::{Deserialize, Serialize};
use sharedkey_core::{
    db::IdentityError,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Identity-mapping kind, if the mapper rejected the operation.
    #[must_use]
    pub const fn identity_kind(&self) -> Option<IdentityErrorKind> {
        match self.kind {
            ErrorKind::Identity(kind) => Some(kind),
            _ => None,
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = ErrorKind::classify(&err);

        Self::new(kind, err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Identity(IdentityErrorKind),
    Query(QueryErrorKind),
    Store(StoreErrorKind),

    /// Entity mapping rejected when the database was built.
    Schema,

    /// Configuration could not be read or is invalid.
    Config,

    /// The caller cannot remediate this.
    Internal,
}

impl ErrorKind {
    fn classify(err: &InternalError) -> Self {
        if let Some(identity) = err.identity_error() {
            return Self::Identity(identity.into());
        }
        if err.is_duplicate_key() {
            return Self::Store(StoreErrorKind::DuplicateKey);
        }
        if err.is_not_found() {
            return Self::Store(StoreErrorKind::NotFound);
        }

        match (err.origin, err.class) {
            (CoreErrorOrigin::Schema, _) => Self::Schema,
            (CoreErrorOrigin::Config, _) => Self::Config,
            (CoreErrorOrigin::Response, ErrorClass::NotFound) => {
                Self::Query(QueryErrorKind::NotFound)
            }
            (CoreErrorOrigin::Response, _) => Self::Query(QueryErrorKind::NotUnique),
            (CoreErrorOrigin::Query, _) => Self::Query(QueryErrorKind::Invalid),
            (_, ErrorClass::Unsupported) => Self::Query(QueryErrorKind::Unsupported),
            (_, ErrorClass::Corruption) => Self::Store(StoreErrorKind::Corruption),
            (_, ErrorClass::Conflict) => Self::Store(StoreErrorKind::Conflict),
            _ => Self::Internal,
        }
    }
}

///
/// IdentityErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum IdentityErrorKind {
    /// Dependent has no parent association to derive its key from.
    MissingAssociation,

    /// Parent has no identifier to copy.
    UnresolvedIdentifier,

    /// Reference target is absent, removed, or from another unit of work.
    OrphanReference,

    /// Dependent already carries a key that differs from its parent's.
    DerivedKeyConflict,

    /// Inverse side points at a row under another key.
    InverseMismatch,
}

impl From<&IdentityError> for IdentityErrorKind {
    fn from(err: &IdentityError) -> Self {
        match err {
            IdentityError::MissingAssociation { .. } => Self::MissingAssociation,
            IdentityError::UnresolvedIdentifier { .. } => Self::UnresolvedIdentifier,
            IdentityError::OrphanReference { .. } => Self::OrphanReference,
            IdentityError::DerivedKeyConflict { .. } => Self::DerivedKeyConflict,
            IdentityError::InverseMismatch { .. } => Self::InverseMismatch,
        }
    }
}

///
/// QueryErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum QueryErrorKind {
    /// Query text or shape is invalid.
    Invalid,

    /// The request is valid but not supported.
    Unsupported,

    /// Valid query, but no rows matched.
    NotFound,

    /// Query expected one row but matched many.
    NotUnique,
}

///
/// StoreErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StoreErrorKind {
    NotFound,
    DuplicateKey,
    Corruption,
    Conflict,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Commit,
    Config,
    Executor,
    Identity,
    Query,
    Relation,
    Response,
    Schema,
    Serialize,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Commit => Self::Commit,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Executor => Self::Executor,
            CoreErrorOrigin::Identity => Self::Identity,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Relation => Self::Relation,
            CoreErrorOrigin::Response => Self::Response,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Serialize => Self::Serialize,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}

///
/// TESTS
///
