use crate::{
    db::{
        commit::{CommitMarker, CommitRowOp},
        store::{RawRow, StoreRegistry},
        unit_of_work::{Removal, Slot},
    },
    error::InternalError,
    key::Key,
};
use tracing::trace;

/// Encode resolved slots and removals into a commit marker.
///
/// `order` lists slot indices parents first; `removals` are already ordered
/// dependents first. Removals of rows that are not stored are dropped.
pub(crate) fn prepare_marker(
    registry: &StoreRegistry,
    slots: &[Slot],
    order: &[usize],
    keys: &[Key],
    removals: &[Removal],
    max_row_bytes: usize,
) -> Result<CommitMarker, InternalError> {
    let mut row_ops = Vec::with_capacity(order.len() + removals.len());

    // Phase 1: writes, parents first.
    for &index in order {
        let slot = &slots[index];
        let path = slot.model().path;
        let key = keys[index].clone();

        let bytes = slot.entity.encode(max_row_bytes)?;
        let after = RawRow::try_new(bytes, max_row_bytes)?;
        let before = registry.try_get_store(path)?.get(&key).cloned();

        row_ops.push(CommitRowOp::new(path, key, before, Some(after)));
    }

    // Phase 2: removals, dependents first.
    for removal in removals {
        let path = removal.model.path;
        let Some(before) = registry.try_get_store(path)?.get(&removal.key).cloned() else {
            trace!(entity = path, key = %removal.key, "removal of absent row skipped");
            continue;
        };

        row_ops.push(CommitRowOp::new(path, removal.key.clone(), Some(before), None));
    }

    Ok(CommitMarker::new(row_ops))
}
