use crate::{
    key::Key,
    types::{Ref, RefTarget},
};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

///
/// DerivedKey
///
/// Shared identifier shape embedded by value in every dependent entity kind.
///
/// `id` is the only persisted column: it is both the primary key and the
/// foreign key to the parent. `parent` is an in-memory reference that the
/// identity mapper reads at persist time and the read path rebuilds from
/// `id` on load.
///

#[derive(Deserialize, Serialize)]
#[serde(bound = "")]
pub struct DerivedKey<P> {
    id: Option<Key>,

    #[serde(skip)]
    parent: Option<Ref<P>>,
}

impl<P> DerivedKey<P> {
    /// Dependent shape with a parent and no identifier yet.
    #[must_use]
    pub fn new(parent: impl Into<Ref<P>>) -> Self {
        Self {
            id: None,
            parent: Some(parent.into()),
        }
    }

    /// Dependent shape with neither identifier nor parent.
    #[must_use]
    pub const fn unassociated() -> Self {
        Self {
            id: None,
            parent: None,
        }
    }

    /// Pre-set the identifier.
    ///
    /// The mapper still derives the key from the parent at persist time and
    /// rejects a pre-set value that disagrees with it.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Key>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> Option<&Key> {
        self.id.as_ref()
    }

    #[must_use]
    pub const fn parent(&self) -> Option<&Ref<P>> {
        self.parent.as_ref()
    }

    pub fn set_parent(&mut self, parent: impl Into<Ref<P>>) {
        self.parent = Some(parent.into());
    }

    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    /// Store a derived identifier. Callers go through the identity mapper.
    pub fn assign(&mut self, id: Key) {
        self.id = Some(id);
    }

    #[must_use]
    pub fn relation_target(&self) -> Option<RefTarget> {
        self.parent.clone().map(Ref::into_target)
    }

    pub fn set_relation_target(&mut self, target: Option<RefTarget>) {
        self.parent = target.map(Ref::from_target);
    }
}

impl<P> Default for DerivedKey<P> {
    fn default() -> Self {
        Self::unassociated()
    }
}

impl<P> Clone for DerivedKey<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            parent: self.parent.clone(),
        }
    }
}

impl<P> Debug for DerivedKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .finish()
    }
}

impl<P> PartialEq for DerivedKey<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.parent == other.parent
    }
}

impl<P> Eq for DerivedKey<P> {}
