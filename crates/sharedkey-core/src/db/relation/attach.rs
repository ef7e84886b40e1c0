use crate::{
    db::{ReadConsistency, store::StoreRegistry},
    error::InternalError,
    key::Key,
    model::FieldKind,
    obs::sink::{MetricsEvent, record},
    traits::EntityKind,
    types::RefTarget,
};
use tracing::trace;

/// Rebuild the non-persisted references of an entity loaded under `key`.
///
/// The owning side of a derived identity points at the parent stored under
/// the same key. Inverse sides point at the dependent stored under the same
/// key, when one exists.
pub(crate) fn attach_relations<E: EntityKind>(
    entity: &mut E,
    key: &Key,
    registry: &StoreRegistry,
    consistency: ReadConsistency,
) -> Result<(), InternalError> {
    let mut attached = 0u64;
    let mut missing = 0u64;

    for field in E::MODEL.fields {
        let FieldKind::Relation(rel) = &field.kind else {
            continue;
        };

        let exists = registry.contains(rel.target_path, key);
        let required = !(rel.is_inverse() && rel.optional);

        if !exists && required && consistency == ReadConsistency::Strict {
            return Err(InternalError::relation_corruption(format!(
                "entity '{}' row {key} has no '{}' row for relation '{}'",
                E::PATH,
                rel.target_entity_name,
                field.name
            )));
        }

        let target = exists.then(|| RefTarget::Key(key.clone()));
        if exists {
            attached += 1;
        } else {
            missing += 1;
        }

        if !entity.set_relation(field.name, target) {
            return Err(InternalError::executor_invariant(format!(
                "entity '{}' does not accept relation field '{}'",
                E::PATH,
                field.name
            )));
        }
    }

    if attached + missing > 0 {
        record(MetricsEvent::RelationAttach {
            entity_path: E::PATH,
            attached,
            missing,
        });
        trace!(entity = E::PATH, key = %key, attached, missing, "relations attached");
    }

    Ok(())
}
