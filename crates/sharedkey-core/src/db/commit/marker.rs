use crate::{db::store::RawRow, key::Key};
use ulid::Ulid;

///
/// CommitRowOp
///
/// Row-level mutation recorded in a commit marker.
/// `before` is the stored image observed at prepare time; `after` is the
/// new image, or `None` for a removal.
///

#[derive(Clone, Debug)]
pub(crate) struct CommitRowOp {
    pub(crate) entity_path: &'static str,
    pub(crate) key: Key,
    pub(crate) before: Option<RawRow>,
    pub(crate) after: Option<RawRow>,
}

impl CommitRowOp {
    #[must_use]
    pub(crate) const fn new(
        entity_path: &'static str,
        key: Key,
        before: Option<RawRow>,
        after: Option<RawRow>,
    ) -> Self {
        Self {
            entity_path,
            key,
            before,
            after,
        }
    }

    pub(crate) const fn is_removal(&self) -> bool {
        self.after.is_none()
    }
}

///
/// CommitMarker
///
/// Mutation plan covering every row op of one unit of work, in apply order.
///

#[derive(Clone, Debug)]
pub(crate) struct CommitMarker {
    pub(crate) id: Ulid,
    pub(crate) row_ops: Vec<CommitRowOp>,
}

impl CommitMarker {
    /// Construct a new commit marker with a fresh commit id.
    pub(crate) fn new(row_ops: Vec<CommitRowOp>) -> Self {
        Self {
            id: Ulid::new(),
            row_ops,
        }
    }
}
