//! Module: model::validate
//! Responsibility: build-time validation of entity mapping descriptors.
//! Does not own: runtime key resolution or row-level relation checks.
//! Boundary: `DbBuilder::build` rejects a schema before any store exists.

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{
        entity::{EntityModel, IdentityModel},
        field::{FieldKind, RelationSide},
    },
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("entity '{path}' registered twice")]
    DuplicateEntity { path: &'static str },

    #[error("entity name '{name}' used by more than one entity")]
    DuplicateEntityName { name: &'static str },

    #[error("entity '{path}' declares field '{field}' twice")]
    DuplicateField {
        path: &'static str,
        field: &'static str,
    },

    #[error("entity '{path}' primary key field '{field}' is missing or not a key field")]
    InvalidPrimaryKey {
        path: &'static str,
        field: &'static str,
    },

    #[error("entity '{path}' derives its identity from '{field}', which is not an owning relation")]
    InvalidDerivedRelation {
        path: &'static str,
        field: &'static str,
    },

    #[error(
        "entity '{path}' field '{field}' is an owning relation without a derived identity; only shared-key associations are mapped"
    )]
    UnsupportedForeignKey {
        path: &'static str,
        field: &'static str,
    },

    #[error("entity '{path}' field '{field}' targets unregistered entity '{target}'")]
    UnknownTarget {
        path: &'static str,
        field: &'static str,
        target: &'static str,
    },

    #[error("entity '{path}' field '{field}' names target '{name}' but '{target}' is registered as '{actual}'")]
    TargetNameMismatch {
        path: &'static str,
        field: &'static str,
        target: &'static str,
        name: &'static str,
        actual: &'static str,
    },

    #[error("entity '{path}' derives its key from '{target}', whose key kind differs")]
    KeyKindMismatch {
        path: &'static str,
        target: &'static str,
    },

    #[error(
        "entity '{path}' field '{field}' is mapped by '{target}.{mapped_by}', which is not a derived owning relation back to '{path}'"
    )]
    InvalidMappedBy {
        path: &'static str,
        field: &'static str,
        target: &'static str,
        mapped_by: &'static str,
    },
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Schema, err.to_string())
    }
}

/// Validate one entity descriptor in isolation.
pub fn validate_model(model: &EntityModel) -> Result<(), SchemaError> {
    // Phase 1: field names are unique and the primary key is a key field.
    let mut names = BTreeSet::new();
    for field in model.fields {
        if !names.insert(field.name) {
            return Err(SchemaError::DuplicateField {
                path: model.path,
                field: field.name,
            });
        }
    }

    if model.key_kind().is_none() {
        return Err(SchemaError::InvalidPrimaryKey {
            path: model.path,
            field: model.primary_key,
        });
    }

    // Phase 2: owning relations exist only as the source of a derived identity.
    let derived = model.derived_relation();
    if let Some(relation) = derived {
        let owning = model
            .relation(relation)
            .is_some_and(|rel| rel.side == RelationSide::Owning);
        if !owning {
            return Err(SchemaError::InvalidDerivedRelation {
                path: model.path,
                field: relation,
            });
        }
    }

    for field in model.fields {
        if let FieldKind::Relation(rel) = &field.kind
            && rel.side == RelationSide::Owning
            && derived != Some(field.name)
        {
            return Err(SchemaError::UnsupportedForeignKey {
                path: model.path,
                field: field.name,
            });
        }
    }

    Ok(())
}

/// Validate a full set of entity descriptors, including cross-entity links.
pub fn validate_schema(models: &[&'static EntityModel]) -> Result<(), SchemaError> {
    let mut paths = BTreeSet::new();
    let mut names = BTreeSet::new();

    for model in models {
        if !paths.insert(model.path) {
            return Err(SchemaError::DuplicateEntity { path: model.path });
        }
        if !names.insert(model.entity_name) {
            return Err(SchemaError::DuplicateEntityName {
                name: model.entity_name,
            });
        }
        validate_model(model)?;
    }

    let find = |path: &str| models.iter().copied().find(|model| model.path == path);

    for model in models {
        for field in model.fields {
            let FieldKind::Relation(rel) = &field.kind else {
                continue;
            };

            // Phase 1: every relation resolves to a registered entity under its declared name.
            let Some(target) = find(rel.target_path) else {
                return Err(SchemaError::UnknownTarget {
                    path: model.path,
                    field: field.name,
                    target: rel.target_path,
                });
            };
            if target.entity_name != rel.target_entity_name {
                return Err(SchemaError::TargetNameMismatch {
                    path: model.path,
                    field: field.name,
                    target: rel.target_path,
                    name: rel.target_entity_name,
                    actual: target.entity_name,
                });
            }

            // Phase 2: side-specific shape.
            match rel.side {
                RelationSide::Owning => {
                    if model.key_kind() != target.key_kind() {
                        return Err(SchemaError::KeyKindMismatch {
                            path: model.path,
                            target: target.path,
                        });
                    }
                }
                RelationSide::Inverse { mapped_by } => {
                    let mirrors = target.identity == IdentityModel::Derived { relation: mapped_by }
                        && target
                            .relation(mapped_by)
                            .is_some_and(|back| back.target_path == model.path);
                    if !mirrors {
                        return Err(SchemaError::InvalidMappedBy {
                            path: model.path,
                            field: field.name,
                            target: target.path,
                            mapped_by,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

///
/// TESTS
///
