use crate::{
    db::{
        commit::CommitRowOp,
        store::{RawRow, StoreRegistry},
    },
    error::InternalError,
    key::Key,
};
use tracing::warn;

///
/// CommitApplyGuard
///
/// Guard for the marker apply phase.
/// Every applied row op records its before-image; dropping the guard
/// without `finish` restores them in reverse order.
///

pub(crate) struct CommitApplyGuard<'a> {
    phase: &'static str,
    finished: bool,
    registry: &'a mut StoreRegistry,
    undo: Vec<(&'static str, Key, Option<RawRow>)>,
}

impl<'a> CommitApplyGuard<'a> {
    pub(crate) const fn new(phase: &'static str, registry: &'a mut StoreRegistry) -> Self {
        Self {
            phase,
            finished: false,
            registry,
            undo: Vec::new(),
        }
    }

    /// Apply one row op and remember how to revert it.
    pub(crate) fn apply(&mut self, op: &CommitRowOp) -> Result<(), InternalError> {
        let store = self.registry.try_get_store_mut(op.entity_path)?;
        let previous = match &op.after {
            Some(row) => store.insert(op.key.clone(), row.clone()),
            None => store.remove(&op.key),
        };
        self.undo.push((op.entity_path, op.key.clone(), previous));

        Ok(())
    }

    pub(crate) fn finish(mut self) -> Result<(), InternalError> {
        if self.finished {
            return Err(InternalError::executor_invariant(format!(
                "commit apply guard invariant violated: finish called twice ({})",
                self.phase
            )));
        }

        self.finished = true;
        self.undo.clear();
        Ok(())
    }

    fn rollback(&mut self) {
        // reverse order to mirror write application
        while let Some((path, key, previous)) = self.undo.pop() {
            let Ok(store) = self.registry.try_get_store_mut(path) else {
                continue;
            };
            match previous {
                Some(row) => store.insert(key, row),
                None => store.remove(&key),
            };
        }
    }
}

impl Drop for CommitApplyGuard<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.undo.is_empty() {
            warn!(phase = self.phase, ops = self.undo.len(), "rolling back partial commit");
            self.rollback();
        }
    }
}
