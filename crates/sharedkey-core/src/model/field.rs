use crate::key::KeyKind;

///
/// FieldModel
/// Runtime field metadata used by the mapper and validation.
///

#[derive(Debug)]
pub struct FieldModel {
    /// Field name as used in relations and textual queries.
    pub name: &'static str,
    /// Runtime type shape.
    pub kind: FieldKind,
}

impl FieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    #[must_use]
    pub const fn relation(&self) -> Option<&RelationModel> {
        match &self.kind {
            FieldKind::Relation(relation) => Some(relation),
            _ => None,
        }
    }
}

///
/// FieldKind
///
/// Minimal type surface needed by the mapper.
/// Scalars are informational; keys and relations drive runtime behavior.
///

#[derive(Debug)]
pub enum FieldKind {
    Key(KeyKind),
    Bool,
    Int,
    Text,
    Uint,
    Relation(RelationModel),
}

///
/// RelationModel
///
/// One side of a one-to-one association.
///

#[derive(Debug)]
pub struct RelationModel {
    pub target_path: &'static str,
    pub target_entity_name: &'static str,
    pub side: RelationSide,
    /// Whether the association may be absent when the row is read back.
    pub optional: bool,
}

impl RelationModel {
    #[must_use]
    pub const fn owning(target_path: &'static str, target_entity_name: &'static str) -> Self {
        Self {
            target_path,
            target_entity_name,
            side: RelationSide::Owning,
            optional: false,
        }
    }

    #[must_use]
    pub const fn inverse(
        target_path: &'static str,
        target_entity_name: &'static str,
        mapped_by: &'static str,
        optional: bool,
    ) -> Self {
        Self {
            target_path,
            target_entity_name,
            side: RelationSide::Inverse { mapped_by },
            optional,
        }
    }

    #[must_use]
    pub const fn is_inverse(&self) -> bool {
        matches!(self.side, RelationSide::Inverse { .. })
    }
}

///
/// RelationSide
///
/// `Owning` holds the join column; with a derived identity that column is
/// the primary key itself. `Inverse` holds no column and is resolved through
/// the owning side named by `mapped_by`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationSide {
    Owning,
    Inverse { mapped_by: &'static str },
}
