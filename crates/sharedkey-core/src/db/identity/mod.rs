//! Module: identity
//! Responsibility: derive dependent primary keys from their owning parent.
//! Does not own: row encoding, store mutation, or read-path attachment.
//! Boundary: every derived key written by a unit of work passes through here.
//!
//! Invariants:
//! - A derived key is a verbatim copy of the parent's key.
//! - Resolution is idempotent for a fixed parent.
//! - Parents precede their dependents in the produced flush order.

mod resolve;


use crate::{
    error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError},
    key::Key,
    obs::sink::{MetricsEvent, record},
    traits::{DerivedEntity, EntityKind, Path},
    types::RefTarget,
};
use std::fmt;
use thiserror::Error as ThisError;

pub(crate) use resolve::{KeyLookup, ResolvedUnit, resolve_unit};

///
/// IdentityError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IdentityError {
    #[error("'{entity}' has no '{relation}' association to derive its key from")]
    MissingAssociation {
        entity: &'static str,
        relation: &'static str,
    },

    #[error("'{entity}' cannot derive its key: '{parent}' has no identifier assigned")]
    UnresolvedIdentifier {
        entity: &'static str,
        parent: &'static str,
    },

    #[error("'{entity}' references '{target}' {reason}")]
    OrphanReference {
        entity: &'static str,
        target: &'static str,
        reason: OrphanReason,
    },

    #[error("'{entity}' carries key {assigned} but its parent resolves to {derived}")]
    DerivedKeyConflict {
        entity: &'static str,
        assigned: Key,
        derived: Key,
    },

    #[error("'{entity}' field '{field}' must reference key {expected}, found {actual}")]
    InverseMismatch {
        entity: &'static str,
        field: &'static str,
        expected: Key,
        actual: Key,
    },
}

impl IdentityError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingAssociation { .. } | Self::UnresolvedIdentifier { .. } => {
                ErrorClass::InvariantViolation
            }
            Self::OrphanReference { .. }
            | Self::DerivedKeyConflict { .. }
            | Self::InverseMismatch { .. } => ErrorClass::Conflict,
        }
    }

    /// Path of the entity the error was raised for.
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        match self {
            Self::MissingAssociation { entity, .. }
            | Self::UnresolvedIdentifier { entity, .. }
            | Self::OrphanReference { entity, .. }
            | Self::DerivedKeyConflict { entity, .. }
            | Self::InverseMismatch { entity, .. } => entity,
        }
    }
}

impl From<IdentityError> for InternalError {
    fn from(err: IdentityError) -> Self {
        Self {
            class: err.class(),
            origin: ErrorOrigin::Identity,
            message: err.to_string(),
            detail: Some(ErrorDetail::Identity(err)),
        }
    }
}

///
/// OrphanReason
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OrphanReason {
    /// Target is neither pending in the unit of work nor stored.
    MissingTarget { key: Key },

    /// Target row is removed by the same unit of work.
    RemovedTarget { key: Key },

    /// Handle was issued by a different unit of work.
    ForeignHandle,

    /// Removing the target would leave this dependent row behind.
    DependentRemains { key: Key },
}

impl fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget { key } => {
                write!(f, "{key}, which is neither registered in this unit of work nor stored")
            }
            Self::RemovedTarget { key } => {
                write!(f, "{key}, which is removed in the same unit of work")
            }
            Self::ForeignHandle => write!(f, "through a handle from another unit of work"),
            Self::DependentRemains { key } => {
                write!(f, "{key}, which cannot be removed while this row remains")
            }
        }
    }
}

/// Derive a dependent key from the parent's key.
///
/// `assigned` is the key the dependent already carries, if any; it must equal
/// the parent's key.
pub(crate) fn derive_key(
    entity: &'static str,
    assigned: Option<Key>,
    parent: &'static str,
    parent_key: Option<Key>,
) -> Result<Key, IdentityError> {
    let Some(derived) = parent_key else {
        return Err(IdentityError::UnresolvedIdentifier { entity, parent });
    };

    match assigned {
        Some(assigned) if assigned != derived => Err(IdentityError::DerivedKeyConflict {
            entity,
            assigned,
            derived,
        }),
        _ => Ok(derived),
    }
}

/// Record a mapper rejection for `err`, if it carries identity detail.
pub(crate) fn record_rejection(err: &InternalError) {
    if let Some(identity) = err.identity_error() {
        record(MetricsEvent::IdentityRejected {
            entity_path: identity.entity(),
        });
    }
}

/// Resolve and assign `dependent`'s key from `parent`.
///
/// The dependent's parent reference must be set. A pending reference is
/// rewritten to the parent's key.
pub fn resolve_derived_key<E: DerivedEntity>(
    dependent: &mut E,
    parent: &E::Parent,
) -> Result<Key, InternalError> {
    assign_from_parent(dependent, parent).inspect_err(record_rejection)
}

fn assign_from_parent<E: DerivedEntity>(
    dependent: &mut E,
    parent: &E::Parent,
) -> Result<Key, InternalError> {
    let relation = E::MODEL.derived_relation().ok_or_else(|| {
        InternalError::identity_invariant(format!(
            "entity '{}' implements DerivedEntity without a derived identity",
            E::PATH
        ))
    })?;

    let Some(target) = dependent.relation(relation) else {
        return Err(IdentityError::MissingAssociation {
            entity: E::PATH,
            relation,
        }
        .into());
    };

    let parent_key = parent.primary_key();
    if let (RefTarget::Key(referenced), Some(parent_key)) = (&target, &parent_key)
        && referenced != parent_key
    {
        return Err(IdentityError::DerivedKeyConflict {
            entity: E::PATH,
            assigned: referenced.clone(),
            derived: parent_key.clone(),
        }
        .into());
    }

    let key = derive_key(
        E::PATH,
        dependent.primary_key(),
        <E::Parent as Path>::PATH,
        parent_key,
    )?;

    dependent.assign_primary_key(key.clone())?;
    dependent.set_relation(relation, Some(RefTarget::Key(key.clone())));
    record(MetricsEvent::IdentityDerived {
        entity_path: E::PATH,
    });

    Ok(key)
}
