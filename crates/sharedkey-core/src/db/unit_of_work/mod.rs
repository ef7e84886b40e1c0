//! Module: unit_of_work
//! Responsibility: collect pending writes and removals, resolve them through
//! the identity mapper, and commit them atomically.
//! Does not own: key derivation rules or store layout.
//!
//! Invariants:
//! - Handles are only valid for the unit that issued them.
//! - `flush` never touches the stores; `commit` writes all rows or none.

mod slot;


pub use slot::SaveMode;
pub(crate) use slot::{Removal, Slot};

use crate::{
    db::{
        Db,
        commit::{apply_marker, prepare_marker},
        identity::{KeyLookup, ResolvedUnit, record_rejection, resolve_unit},
        relation::{order_removals, validate_removals},
        store::StoreRegistry,
    },
    error::InternalError,
    key::Key,
    obs::sink::{ExecKind, MetricsSink, Span, with_optional_sink},
    traits::EntityKind,
    types::{Handle, SlotId},
};
use slot::{slot_entity, slot_entity_mut};
use std::collections::BTreeSet;
use tracing::debug;
use ulid::Ulid;

///
/// UnitOfWork
///
/// Arena of entities pending persistence in one atomic commit.
/// Dropping an uncommitted unit discards it.
///

pub struct UnitOfWork {
    id: Ulid,
    db: Db,
    debug: bool,
    metrics: Option<&'static dyn MetricsSink>,
    slots: Vec<Slot>,
    removals: Vec<Removal>,
}

impl UnitOfWork {
    pub(crate) fn new(db: Db, debug: bool, metrics: Option<&'static dyn MetricsSink>) -> Self {
        Self {
            id: Ulid::new(),
            db,
            debug,
            metrics,
            slots: Vec::new(),
            removals: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Ulid {
        self.id
    }

    /// Number of registered entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.removals.is_empty()
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register a new entity. Committing fails if its key is already stored.
    pub fn register<E: EntityKind>(&mut self, entity: E) -> Handle<E> {
        self.push(SaveMode::Insert, entity)
    }

    /// Register an entity that replaces any stored row under the same key.
    pub fn merge<E: EntityKind>(&mut self, entity: E) -> Handle<E> {
        self.push(SaveMode::Replace, entity)
    }

    /// Remove the stored row of `E` under `key`.
    pub fn remove<E: EntityKind>(&mut self, key: impl Into<Key>) {
        self.removals.push(Removal {
            model: E::MODEL,
            key: key.into(),
        });
    }

    fn push<E: EntityKind>(&mut self, mode: SaveMode, entity: E) -> Handle<E> {
        let slot = SlotId::new(self.id, self.slots.len());
        self.slots.push(Slot::new(mode, entity));

        Handle::new(slot)
    }

    // ---------------------------------------------------------------------
    // Access
    // ---------------------------------------------------------------------

    pub fn get<E: EntityKind>(&self, handle: Handle<E>) -> Result<&E, InternalError> {
        slot_entity(self.id, &self.slots, handle)
    }

    pub fn get_mut<E: EntityKind>(&mut self, handle: Handle<E>) -> Result<&mut E, InternalError> {
        slot_entity_mut(self.id, &mut self.slots, handle)
    }

    // ---------------------------------------------------------------------
    // Flush / commit
    // ---------------------------------------------------------------------

    /// Resolve every pending key and reference and validate the unit
    /// against the stores, without writing.
    ///
    /// On error the pending entities are left as they were.
    pub fn flush(&mut self) -> Result<(), InternalError> {
        let sink = self.metrics;

        with_optional_sink(sink, || self.stage().map(|_| ()))
    }

    /// Flush, then apply every row of the unit in one commit.
    pub fn commit(self) -> Result<CommitResponse, InternalError> {
        let sink = self.metrics;

        with_optional_sink(sink, move || self.commit_staged())
    }

    fn commit_staged(mut self) -> Result<CommitResponse, InternalError> {
        let mut span = Span::new(ExecKind::Commit, None);

        // Phase 1: resolve and validate.
        let staged = self.stage()?;

        // Phase 2: encode the marker against the current stores.
        let max_row_bytes = self.db.config().max_row_bytes();
        let marker = self.db.with_registry(|registry| {
            prepare_marker(
                registry,
                &self.slots,
                &staged.order,
                &staged.keys,
                &staged.removals,
                max_row_bytes,
            )
        })?;
        if self.debug {
            debug!(
                unit = %self.id,
                commit_id = %marker.id,
                row_ops = marker.row_ops.len(),
                "commit marker prepared"
            );
        }

        // Phase 3: apply.
        let stats = self
            .db
            .with_registry_mut(|registry| apply_marker(registry, &marker))?;
        span.set_rows((stats.rows_written + stats.rows_removed) as u64);

        Ok(CommitResponse {
            commit_id: marker.id,
            unit: self.id,
            rows_written: stats.rows_written,
            rows_removed: stats.rows_removed,
            slots: self.slots,
            keys: staged.keys,
        })
    }

    // Resolve a copy of the arena and swap it in only on success.
    fn stage(&mut self) -> Result<StagedUnit, InternalError> {
        let mut slots = self.slots.clone();
        let staged = self
            .db
            .with_registry(|registry| stage_unit(registry, self.id, &mut slots, &self.removals))?;

        if self.debug {
            debug!(
                unit = %self.id,
                writes = staged.order.len(),
                removals = staged.removals.len(),
                "unit of work flushed"
            );
        }

        self.slots = slots;

        Ok(staged)
    }
}

fn stage_unit(
    registry: &StoreRegistry,
    unit: Ulid,
    slots: &mut [Slot],
    pending_removals: &[Removal],
) -> Result<StagedUnit, InternalError> {
    // Phase 1: every entity kind is registered.
    for slot in slots.iter() {
        registry.try_get_model(slot.model().path)?;
    }
    for removal in pending_removals {
        registry.try_get_model(removal.model.path)?;
    }

    // Phase 2: derive keys and rewrite pending references.
    let removed: BTreeSet<(&'static str, Key)> = pending_removals
        .iter()
        .map(|removal| (removal.model.path, removal.key.clone()))
        .collect();
    let lookup = StagedLookup {
        registry,
        removed: &removed,
    };
    let ResolvedUnit { order, keys } =
        resolve_unit(unit, slots, &lookup).inspect_err(record_rejection)?;

    // Phase 3: insert-mode rows must not collide with surviving rows.
    for &index in &order {
        let model = slots[index].model();
        if slots[index].mode == SaveMode::Insert && lookup.contains(model.path, &keys[index]) {
            return Err(InternalError::store_duplicate_key(format!(
                "{}({})",
                model.entity_name, keys[index]
            )));
        }
    }

    // Phase 4: removals not superseded by a write, dependents first.
    let written: BTreeSet<(&'static str, &Key)> = order
        .iter()
        .map(|&index| (slots[index].model().path, &keys[index]))
        .collect();
    let mut removals: Vec<Removal> = Vec::with_capacity(pending_removals.len());
    for removal in pending_removals {
        let superseded = written.contains(&(removal.model.path, &removal.key));
        let duplicate = removals
            .iter()
            .any(|r| r.model.path == removal.model.path && r.key == removal.key);
        if !superseded && !duplicate {
            removals.push(removal.clone());
        }
    }
    validate_removals(registry, &removals, &removed).inspect_err(record_rejection)?;
    order_removals(registry, &mut removals);

    Ok(StagedUnit {
        order,
        keys,
        removals,
    })
}

///
/// StagedUnit
///

struct StagedUnit {
    order: Vec<usize>,
    keys: Vec<Key>,
    removals: Vec<Removal>,
}

///
/// StagedLookup
///
/// Stored rows as they will look once this unit's removals apply.
///

struct StagedLookup<'a> {
    registry: &'a StoreRegistry,
    removed: &'a BTreeSet<(&'static str, Key)>,
}

impl KeyLookup for StagedLookup<'_> {
    fn contains(&self, path: &'static str, key: &Key) -> bool {
        self.registry.contains(path, key) && !self.is_removed(path, key)
    }

    fn is_removed(&self, path: &'static str, key: &Key) -> bool {
        self.removed.contains(&(path, key.clone()))
    }
}

///
/// CommitResponse
///
/// Outcome of a committed unit of work: the commit id, row counts, and the
/// entities as written, reachable through their handles.
///

#[derive(Debug)]
pub struct CommitResponse {
    commit_id: Ulid,
    unit: Ulid,
    rows_written: usize,
    rows_removed: usize,
    slots: Vec<Slot>,
    keys: Vec<Key>,
}

impl CommitResponse {
    #[must_use]
    pub const fn commit_id(&self) -> Ulid {
        self.commit_id
    }

    #[must_use]
    pub const fn rows_written(&self) -> usize {
        self.rows_written
    }

    #[must_use]
    pub const fn rows_removed(&self) -> usize {
        self.rows_removed
    }

    /// Entity as written, with every reference resolved to a key.
    pub fn entity<E: EntityKind>(&self, handle: Handle<E>) -> Result<&E, InternalError> {
        slot_entity(self.unit, &self.slots, handle)
    }

    /// Primary key the entity was written under.
    pub fn key<E: EntityKind>(&self, handle: Handle<E>) -> Result<Key, InternalError> {
        slot_entity(self.unit, &self.slots, handle)?;

        Ok(self.keys[handle.slot().index()].clone())
    }
}
