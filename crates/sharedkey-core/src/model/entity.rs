use crate::{
    key::KeyKind,
    model::field::{FieldKind, FieldModel, RelationModel},
};

///
/// EntityModel
///
/// Declarative mapping descriptor for one entity type: natural or derived
/// key field, and the field pair defining a shared-identifier association.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Fully-qualified Rust type path (for dispatch and diagnostics).
    pub path: &'static str,
    /// Stable external name used in textual queries.
    pub entity_name: &'static str,
    /// Primary key field name (points at an entry in `fields`).
    pub primary_key: &'static str,
    /// Ordered field list.
    pub fields: &'static [FieldModel],
    /// How the primary key is obtained.
    pub identity: IdentityModel,
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&'static RelationModel> {
        self.field(name).and_then(FieldModel::relation)
    }

    /// Declared key kind of the primary key field, if the field is well-formed.
    #[must_use]
    pub fn key_kind(&self) -> Option<KeyKind> {
        match self.field(self.primary_key).map(|field| &field.kind) {
            Some(FieldKind::Key(kind)) => Some(*kind),
            _ => None,
        }
    }

    /// Relation field that the primary key is derived from, if any.
    #[must_use]
    pub const fn derived_relation(&self) -> Option<&'static str> {
        match self.identity {
            IdentityModel::Derived { relation } => Some(relation),
            IdentityModel::Natural => None,
        }
    }
}

///
/// IdentityModel
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentityModel {
    /// Key is supplied by the caller (natural key).
    Natural,

    /// Key is copied from the parent referenced by the named owning relation.
    Derived { relation: &'static str },
}
