use crate::key::Key;
use std::{
    fmt::{self, Debug},
    marker::PhantomData,
};
use ulid::Ulid;

///
/// SlotId
///
/// Position of one registered entity inside a unit-of-work arena.
/// `unit` identifies the arena so handles cannot leak across units.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SlotId {
    pub(crate) unit: Ulid,
    pub(crate) index: usize,
}

impl SlotId {
    pub(crate) const fn new(unit: Ulid, index: usize) -> Self {
        Self { unit, index }
    }

    #[must_use]
    pub const fn unit(&self) -> Ulid {
        self.unit
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

///
/// RefTarget
///
/// Untyped target of an entity reference: either a committed primary key
/// or an entity still pending in a unit of work.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RefTarget {
    Key(Key),
    Pending(SlotId),
}

impl RefTarget {
    #[must_use]
    pub const fn as_key(&self) -> Option<&Key> {
        match self {
            Self::Key(key) => Some(key),
            Self::Pending(_) => None,
        }
    }
}

///
/// Handle
///
/// Typed handle to an entity registered in a unit of work.
///

pub struct Handle<E> {
    slot: SlotId,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Handle<E> {
    pub(crate) const fn new(slot: SlotId) -> Self {
        Self {
            slot,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn slot(&self) -> SlotId {
        self.slot
    }
}

impl<E> Clone for Handle<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Handle<E> {}

impl<E> Debug for Handle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.slot).finish()
    }
}

impl<E> PartialEq for Handle<E> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<E> Eq for Handle<E> {}

///
/// Ref
///
/// Typed id-lookup reference from one entity to another.
/// References never own or point at the target; they are resolved by the
/// runtime through the unit-of-work arena or the stores.
///

pub struct Ref<E> {
    target: RefTarget,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Ref<E> {
    /// Reference a committed entity by primary key.
    #[must_use]
    pub fn key(key: impl Into<Key>) -> Self {
        Self::from_target(RefTarget::Key(key.into()))
    }

    #[must_use]
    pub const fn from_target(target: RefTarget) -> Self {
        Self {
            target,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &RefTarget {
        &self.target
    }

    #[must_use]
    pub fn into_target(self) -> RefTarget {
        self.target
    }

    #[must_use]
    pub const fn as_key(&self) -> Option<&Key> {
        self.target.as_key()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.target, RefTarget::Pending(_))
    }
}

impl<E> From<Handle<E>> for Ref<E> {
    fn from(handle: Handle<E>) -> Self {
        Self::from_target(RefTarget::Pending(handle.slot))
    }
}

impl<E> From<&Handle<E>> for Ref<E> {
    fn from(handle: &Handle<E>) -> Self {
        Self::from(*handle)
    }
}

impl<E> Clone for Ref<E> {
    fn clone(&self) -> Self {
        Self::from_target(self.target.clone())
    }
}

impl<E> Debug for Ref<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RefTarget::Key(key) => write!(f, "Ref({key})"),
            RefTarget::Pending(slot) => write!(f, "Ref(pending #{})", slot.index),
        }
    }
}

impl<E> PartialEq for Ref<E> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl<E> Eq for Ref<E> {}
