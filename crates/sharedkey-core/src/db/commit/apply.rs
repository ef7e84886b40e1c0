use crate::{
    db::{
        commit::{CommitMarker, guard::CommitApplyGuard},
        store::StoreRegistry,
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    obs::sink::{MetricsEvent, record},
};
use tracing::debug;

///
/// CommitStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct CommitStats {
    pub(crate) rows_written: usize,
    pub(crate) rows_removed: usize,
}

/// Apply a prepared marker to the stores.
///
/// Every row must still hold the before-image captured at prepare time;
/// otherwise nothing is written.
pub(crate) fn apply_marker(
    registry: &mut StoreRegistry,
    marker: &CommitMarker,
) -> Result<CommitStats, InternalError> {
    // Phase 1: preflight against the before-images.
    for op in &marker.row_ops {
        let store = registry.try_get_store(op.entity_path)?;
        if store.get(&op.key) != op.before.as_ref() {
            return Err(InternalError::new(
                ErrorClass::Conflict,
                ErrorOrigin::Commit,
                format!(
                    "commit {} conflict: row '{}' {} changed since prepare",
                    marker.id, op.entity_path, op.key
                ),
            ));
        }
    }

    // Phase 2: mechanical apply under the rollback guard.
    let mut stats = CommitStats::default();
    let mut guard = CommitApplyGuard::new("apply_marker", registry);
    for op in &marker.row_ops {
        guard.apply(op)?;
        if op.is_removal() {
            stats.rows_removed += 1;
        } else {
            stats.rows_written += 1;
        }
    }
    guard.finish()?;

    record(MetricsEvent::CommitApplied {
        rows_written: stats.rows_written as u64,
        rows_removed: stats.rows_removed as u64,
    });
    debug!(
        commit_id = %marker.id,
        rows_written = stats.rows_written,
        rows_removed = stats.rows_removed,
        "commit applied"
    );

    Ok(stats)
}
