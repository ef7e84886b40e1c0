use crate::{
    db::{
        identity::{IdentityError, OrphanReason, derive_key},
        unit_of_work::Slot,
    },
    error::InternalError,
    key::Key,
    model::{EntityModel, FieldKind, RelationModel, RelationSide},
    obs::sink::{MetricsEvent, record},
    types::{RefTarget, SlotId},
};
use std::collections::BTreeMap;
use tracing::{debug, trace};
use ulid::Ulid;

///
/// KeyLookup
///
/// Committed-row view used while resolving a unit of work.
///

pub(crate) trait KeyLookup {
    /// Whether a committed row exists and survives the unit of work.
    fn contains(&self, path: &'static str, key: &Key) -> bool;

    /// Whether the unit of work removes this committed row.
    fn is_removed(&self, path: &'static str, key: &Key) -> bool;
}

///
/// ResolvedUnit
///

#[derive(Debug)]
pub(crate) struct ResolvedUnit {
    /// Slot indices, parents before dependents.
    pub(crate) order: Vec<usize>,
    /// Resolved primary key per slot index.
    pub(crate) keys: Vec<Key>,
}

/// Resolve every slot's primary key, rewrite pending references to keys,
/// and validate relation targets.
pub(crate) fn resolve_unit(
    unit: Ulid,
    slots: &mut [Slot],
    lookup: &dyn KeyLookup,
) -> Result<ResolvedUnit, InternalError> {
    let mut resolver = Resolver {
        unit,
        marks: vec![Mark::Unvisited; slots.len()],
        post_order: Vec::with_capacity(slots.len()),
        slots,
        lookup,
    };

    // Phase 1: derive keys depth-first so parents resolve before dependents.
    // A dependent of an unidentified parent fails here, whatever the
    // registration order.
    let mut resolved = Vec::with_capacity(resolver.slots.len());
    for index in 0..resolver.slots.len() {
        resolved.push(resolver.resolve_slot(index)?);
    }

    let mut keys = Vec::with_capacity(resolved.len());
    for (index, key) in resolved.into_iter().enumerate() {
        let model = resolver.slots[index].model();
        let Some(key) = key else {
            return Err(IdentityError::UnresolvedIdentifier {
                entity: model.path,
                parent: model.path,
            }
            .into());
        };
        if model.key_kind().is_some_and(|kind| !key.matches_kind(kind)) {
            return Err(InternalError::executor_unsupported(format!(
                "entity '{}' key {key} does not match its declared key kind",
                model.path
            )));
        }
        keys.push(key);
    }

    // Phase 2: one pending row per (entity, key).
    let mut index = BTreeMap::new();
    for (slot, key) in keys.iter().enumerate() {
        let model = resolver.slots[slot].model();
        if index.insert((model.path, key.clone()), slot).is_some() {
            return Err(InternalError::store_duplicate_key(format!(
                "{}({key})",
                model.entity_name
            )));
        }
    }

    // Phase 3: every reference targets a live row under the right key.
    for slot in 0..resolver.slots.len() {
        resolver.validate_references(slot, &keys, &index)?;
    }

    // Phase 4: parents first, registration order otherwise.
    let mut depths = vec![0usize; keys.len()];
    for slot in 0..keys.len() {
        depths[slot] = resolver.depth(slot, &keys, &index)?;
    }
    let mut order = resolver.post_order;
    order.sort_by_key(|slot| depths[*slot]);

    debug!(unit = %unit, slots = keys.len(), "identity resolution complete");

    Ok(ResolvedUnit { order, keys })
}

#[derive(Clone, Debug)]
enum Mark {
    Unvisited,
    Visiting,
    Done(Option<Key>),
}

struct Resolver<'a> {
    unit: Ulid,
    slots: &'a mut [Slot],
    lookup: &'a dyn KeyLookup,
    marks: Vec<Mark>,
    post_order: Vec<usize>,
}

impl Resolver<'_> {
    fn resolve_slot(&mut self, index: usize) -> Result<Option<Key>, InternalError> {
        match &self.marks[index] {
            Mark::Done(key) => return Ok(key.clone()),
            Mark::Visiting => {
                return Err(InternalError::identity_invariant(format!(
                    "derived identity cycle through '{}' (slot {index})",
                    self.slots[index].model().path
                )));
            }
            Mark::Unvisited => {}
        }

        self.marks[index] = Mark::Visiting;

        let model = self.slots[index].model();
        let key = match model.derived_relation() {
            Some(relation) => Some(self.derive_slot(index, model, relation)?),
            None => self.slots[index].entity.pending_key(),
        };

        self.marks[index] = Mark::Done(key.clone());
        self.post_order.push(index);

        Ok(key)
    }

    fn derive_slot(
        &mut self,
        index: usize,
        model: &'static EntityModel,
        relation: &'static str,
    ) -> Result<Key, InternalError> {
        let rel = model.relation(relation).ok_or_else(|| {
            InternalError::identity_invariant(format!(
                "entity '{}' derives its key from unknown relation '{relation}'",
                model.path
            ))
        })?;

        let Some(target) = self.slots[index].entity.relation_target(relation) else {
            return Err(IdentityError::MissingAssociation {
                entity: model.path,
                relation,
            }
            .into());
        };

        let parent_key = match target {
            RefTarget::Key(key) => Some(key),
            RefTarget::Pending(slot) => {
                let parent = self.pending_slot(model.path, rel, slot)?;
                self.resolve_slot(parent)?
            }
        };

        let entity = &mut self.slots[index].entity;
        let key = derive_key(model.path, entity.pending_key(), rel.target_path, parent_key)?;
        entity.assign_key(key.clone())?;
        entity.set_relation_target(relation, Some(RefTarget::Key(key.clone())));

        record(MetricsEvent::IdentityDerived {
            entity_path: model.path,
        });
        trace!(entity = model.path, key = %key, "derived key assigned");

        Ok(key)
    }

    // Map a pending handle onto a slot of this unit, checking its target kind.
    fn pending_slot(
        &self,
        entity: &'static str,
        rel: &RelationModel,
        slot: SlotId,
    ) -> Result<usize, InternalError> {
        if slot.unit() != self.unit {
            return Err(IdentityError::OrphanReference {
                entity,
                target: rel.target_path,
                reason: OrphanReason::ForeignHandle,
            }
            .into());
        }

        let Some(target) = self.slots.get(slot.index()) else {
            return Err(InternalError::identity_invariant(format!(
                "handle #{} is out of range for this unit of work",
                slot.index()
            )));
        };
        if target.model().path != rel.target_path {
            return Err(InternalError::identity_invariant(format!(
                "handle #{} points at '{}', expected '{}'",
                slot.index(),
                target.model().path,
                rel.target_path
            )));
        }

        Ok(slot.index())
    }

    fn validate_references(
        &mut self,
        slot: usize,
        keys: &[Key],
        index: &BTreeMap<(&'static str, Key), usize>,
    ) -> Result<(), InternalError> {
        let model = self.slots[slot].model();

        for field in model.fields {
            let FieldKind::Relation(rel) = &field.kind else {
                continue;
            };
            let Some(target) = self.slots[slot].entity.relation_target(field.name) else {
                continue;
            };

            match rel.side {
                RelationSide::Owning => {
                    let RefTarget::Key(key) = target else {
                        return Err(InternalError::identity_invariant(format!(
                            "entity '{}' relation '{}' still pending after resolution",
                            model.path, field.name
                        )));
                    };
                    self.require_target(model.path, rel, &key, index)?;
                }
                RelationSide::Inverse { .. } => {
                    let actual = match target {
                        RefTarget::Key(key) => key,
                        RefTarget::Pending(handle) => {
                            keys[self.pending_slot(model.path, rel, handle)?].clone()
                        }
                    };

                    if actual != keys[slot] {
                        return Err(IdentityError::InverseMismatch {
                            entity: model.path,
                            field: field.name,
                            expected: keys[slot].clone(),
                            actual,
                        }
                        .into());
                    }
                    self.require_target(model.path, rel, &actual, index)?;

                    self.slots[slot]
                        .entity
                        .set_relation_target(field.name, Some(RefTarget::Key(actual)));
                }
            }
        }

        Ok(())
    }

    fn require_target(
        &self,
        entity: &'static str,
        rel: &RelationModel,
        key: &Key,
        index: &BTreeMap<(&'static str, Key), usize>,
    ) -> Result<(), IdentityError> {
        if index.contains_key(&(rel.target_path, key.clone()))
            || self.lookup.contains(rel.target_path, key)
        {
            return Ok(());
        }

        let reason = if self.lookup.is_removed(rel.target_path, key) {
            OrphanReason::RemovedTarget { key: key.clone() }
        } else {
            OrphanReason::MissingTarget { key: key.clone() }
        };

        Err(IdentityError::OrphanReference {
            entity,
            target: rel.target_path,
            reason,
        })
    }

    // Number of pending ancestors reachable through derived relations.
    fn depth(
        &self,
        slot: usize,
        keys: &[Key],
        index: &BTreeMap<(&'static str, Key), usize>,
    ) -> Result<usize, InternalError> {
        let mut depth = 0;
        let mut current = slot;

        while let Some(relation) = self.slots[current].model().derived_relation() {
            let Some(rel) = self.slots[current].model().relation(relation) else {
                break;
            };
            let Some(&parent) = index.get(&(rel.target_path, keys[current].clone())) else {
                break;
            };

            depth += 1;
            if depth > keys.len() {
                return Err(InternalError::identity_invariant(format!(
                    "derived identity cycle through '{}' ({})",
                    self.slots[slot].model().path,
                    keys[slot]
                )));
            }
            current = parent;
        }

        Ok(depth)
    }
}
