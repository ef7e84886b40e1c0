use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::Key,
    model::EntityModel,
    types::RefTarget,
};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

// ============================================================================
// FOUNDATIONAL KINDS
// ============================================================================

///
/// Path
/// Fully-qualified schema path.
///

pub trait Path {
    const PATH: &'static str;
}

// ============================================================================
// ENTITY RUNTIME SURFACE
// ============================================================================

///
/// EntityKind
///
/// Runtime contract every mapped entity implements.
///
/// Relation accessors work on untyped [`RefTarget`]s so the unit of work can
/// resolve references without knowing concrete entity types. Inverse
/// relation fields and derived parent references are not persisted; the
/// implementing type marks them `#[serde(skip)]`.
///

pub trait EntityKind: Path + Clone + Debug + Serialize + DeserializeOwned + 'static {
    const MODEL: &'static EntityModel;

    /// Current primary key, or `None` while it is unresolved.
    fn primary_key(&self) -> Option<Key>;

    /// Store a primary key produced by the identity mapper.
    ///
    /// Only entities with a derived identity accept assigned keys.
    fn assign_primary_key(&mut self, key: Key) -> Result<(), InternalError> {
        let _ = key;

        Err(InternalError::new(
            ErrorClass::Unsupported,
            ErrorOrigin::Identity,
            format!("entity '{}' has a natural key and cannot be assigned one", Self::PATH),
        ))
    }

    /// Read the reference held by relation field `field`.
    fn relation(&self, field: &str) -> Option<RefTarget> {
        let _ = field;
        None
    }

    /// Overwrite the reference held by relation field `field`.
    /// Returns `false` when the entity has no such relation field.
    fn set_relation(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        let _ = (field, target);
        false
    }
}

///
/// DerivedEntity
///
/// Entity whose primary key is copied from the parent it references.
///

pub trait DerivedEntity: EntityKind {
    type Parent: EntityKind;
}
