use crate::{
    db::identity::{IdentityError, OrphanReason},
    error::InternalError,
    key::Key,
    model::EntityModel,
    serialize::{SerializeError, serialize},
    traits::EntityKind,
    types::{Handle, RefTarget},
};
use dyn_clone::DynClone;
use std::{any::Any, fmt::Debug};
use ulid::Ulid;

///
/// PendingEntity
///
/// Type-erased view of an entity registered in a unit of work.
/// Implemented for every `EntityKind`.
///

pub(crate) trait PendingEntity: Any + Debug + DynClone {
    fn model(&self) -> &'static EntityModel;

    fn pending_key(&self) -> Option<Key>;

    fn assign_key(&mut self, key: Key) -> Result<(), InternalError>;

    fn relation_target(&self, field: &str) -> Option<RefTarget>;

    fn set_relation_target(&mut self, field: &str, target: Option<RefTarget>) -> bool;

    fn encode(&self, max_bytes: usize) -> Result<Vec<u8>, SerializeError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

dyn_clone::clone_trait_object!(PendingEntity);

impl<E: EntityKind> PendingEntity for E {
    fn model(&self) -> &'static EntityModel {
        E::MODEL
    }

    fn pending_key(&self) -> Option<Key> {
        self.primary_key()
    }

    fn assign_key(&mut self, key: Key) -> Result<(), InternalError> {
        self.assign_primary_key(key)
    }

    fn relation_target(&self, field: &str) -> Option<RefTarget> {
        self.relation(field)
    }

    fn set_relation_target(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        self.set_relation(field, target)
    }

    fn encode(&self, max_bytes: usize) -> Result<Vec<u8>, SerializeError> {
        serialize(self, max_bytes)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

///
/// SaveMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveMode {
    /// Fail if a row with the same key is already stored.
    Insert,

    /// Overwrite any stored row with the same key.
    Replace,
}

///
/// Slot
///

#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub(crate) mode: SaveMode,
    pub(crate) entity: Box<dyn PendingEntity>,
}

impl Slot {
    pub(crate) fn new<E: EntityKind>(mode: SaveMode, entity: E) -> Self {
        Self {
            mode,
            entity: Box::new(entity),
        }
    }

    pub(crate) fn model(&self) -> &'static EntityModel {
        self.entity.model()
    }
}

///
/// Removal
///

#[derive(Clone, Debug)]
pub(crate) struct Removal {
    pub(crate) model: &'static EntityModel,
    pub(crate) key: Key,
}

// Map a typed handle onto a slot index of unit `unit`.
fn slot_index<E: EntityKind>(
    unit: Ulid,
    slots: &[Slot],
    handle: Handle<E>,
) -> Result<usize, InternalError> {
    let slot = handle.slot();
    if slot.unit() != unit {
        return Err(IdentityError::OrphanReference {
            entity: E::PATH,
            target: E::PATH,
            reason: OrphanReason::ForeignHandle,
        }
        .into());
    }
    if slot.index() >= slots.len() {
        return Err(InternalError::executor_invariant(format!(
            "handle #{} is out of range for this unit of work",
            slot.index()
        )));
    }

    Ok(slot.index())
}

fn type_mismatch<E: EntityKind>(slot: &Slot) -> InternalError {
    InternalError::executor_invariant(format!(
        "handle for '{}' points at a '{}' slot",
        E::PATH,
        slot.model().path
    ))
}

pub(crate) fn slot_entity<E: EntityKind>(
    unit: Ulid,
    slots: &[Slot],
    handle: Handle<E>,
) -> Result<&E, InternalError> {
    let slot = &slots[slot_index(unit, slots, handle)?];

    slot.entity
        .as_any()
        .downcast_ref::<E>()
        .ok_or_else(|| type_mismatch::<E>(slot))
}

pub(crate) fn slot_entity_mut<E: EntityKind>(
    unit: Ulid,
    slots: &mut [Slot],
    handle: Handle<E>,
) -> Result<&mut E, InternalError> {
    let index = slot_index(unit, slots, handle)?;
    if !slots[index].entity.as_any().is::<E>() {
        return Err(type_mismatch::<E>(&slots[index]));
    }

    slots[index]
        .entity
        .as_any_mut()
        .downcast_mut::<E>()
        .ok_or_else(|| InternalError::executor_invariant("pending slot changed type"))
}
