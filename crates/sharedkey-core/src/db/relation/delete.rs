use crate::{
    db::{
        identity::{IdentityError, OrphanReason},
        store::StoreRegistry,
        unit_of_work::Removal,
    },
    error::InternalError,
    key::Key,
    model::EntityModel,
    obs::sink::{MetricsEvent, record},
};
use std::collections::BTreeSet;

/// Reject removals that would leave a stored dependent without its parent.
///
/// `removed` holds every (entity path, key) removed by the same unit of work.
pub(crate) fn validate_removals(
    registry: &StoreRegistry,
    removals: &[Removal],
    removed: &BTreeSet<(&'static str, Key)>,
) -> Result<(), InternalError> {
    for removal in removals {
        for dependent in dependents_of(registry, removal.model) {
            let row = (dependent.path, removal.key.clone());
            if registry.contains(dependent.path, &removal.key) && !removed.contains(&row) {
                record(MetricsEvent::DeleteBlocked {
                    entity_path: removal.model.path,
                });

                return Err(IdentityError::OrphanReference {
                    entity: dependent.path,
                    target: removal.model.path,
                    reason: OrphanReason::DependentRemains {
                        key: removal.key.clone(),
                    },
                }
                .into());
            }
        }
    }

    Ok(())
}

/// Order removals so dependents are removed before their parents.
pub(crate) fn order_removals(registry: &StoreRegistry, removals: &mut [Removal]) {
    removals.sort_by_key(|removal| std::cmp::Reverse(chain_depth(registry, removal.model)));
}

// Models whose identity is derived from `parent`.
fn dependents_of<'a>(
    registry: &'a StoreRegistry,
    parent: &'static EntityModel,
) -> impl Iterator<Item = &'static EntityModel> + 'a {
    registry.models().filter(move |model| {
        model
            .derived_relation()
            .and_then(|relation| model.relation(relation))
            .is_some_and(|rel| rel.target_path == parent.path)
    })
}

// Length of the derived-identity chain above `model`, bounded by the
// number of registered models.
fn chain_depth(registry: &StoreRegistry, model: &'static EntityModel) -> usize {
    let limit = registry.models().count();
    let mut depth = 0;
    let mut current = model;

    while depth < limit {
        let Some(parent) = current
            .derived_relation()
            .and_then(|relation| current.relation(relation))
            .and_then(|rel| registry.model(rel.target_path))
        else {
            break;
        };
        depth += 1;
        current = parent;
    }

    depth
}
