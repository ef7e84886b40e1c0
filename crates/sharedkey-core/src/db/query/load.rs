use crate::{
    db::{
        Db, ReadConsistency,
        query::{Access, check_key_kind},
        relation::attach_relations,
        response::Response,
        store::{DataStore, RawRow, StoreRegistry},
    },
    error::InternalError,
    key::Key,
    obs::sink::{ExecKind, Span},
    traits::EntityKind,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Load the rows of `E` selected by `access`, attaching relations.
pub(crate) fn execute_load<E: EntityKind>(
    db: &Db,
    access: &Access,
    consistency: ReadConsistency,
    debug: bool,
) -> Result<Response<E>, InternalError> {
    let mut span = Span::new(ExecKind::Load, Some(E::PATH));

    // Phase 1: validate keys against the declared key kind.
    for key in access.keys() {
        check_key_kind(E::MODEL, key)?;
    }

    // Phase 2: collect, decode and attach.
    let max_row_bytes = db.config().max_row_bytes();
    let rows = db.with_registry(|registry| {
        let store = registry.try_get_store(E::PATH)?;
        let raw = select_rows::<E>(store, access, consistency)?;

        raw.into_iter()
            .map(|(key, row)| decode_row::<E>(registry, key, &row, max_row_bytes, consistency))
            .collect::<Result<Vec<_>, _>>()
    })?;

    span.set_rows(rows.len() as u64);
    if debug {
        debug!(
            entity = E::PATH,
            rows = rows.len(),
            consistency = ?consistency,
            "load executed"
        );
    }

    Ok(Response::new(rows))
}

fn select_rows<E: EntityKind>(
    store: &DataStore,
    access: &Access,
    consistency: ReadConsistency,
) -> Result<Vec<(Key, RawRow)>, InternalError> {
    if let Access::All = access {
        return Ok(store
            .iter()
            .map(|(key, row)| (key.clone(), row.clone()))
            .collect());
    }

    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();
    for key in access.keys() {
        if !seen.insert(key) {
            continue;
        }

        match store.get(key) {
            Some(row) => rows.push((key.clone(), row.clone())),
            None if consistency == ReadConsistency::Strict => {
                return Err(InternalError::store_corruption(format!(
                    "missing row: {}({key})",
                    E::MODEL.entity_name
                )));
            }
            None => {}
        }
    }

    Ok(rows)
}

fn decode_row<E: EntityKind>(
    registry: &StoreRegistry,
    key: Key,
    row: &RawRow,
    max_row_bytes: usize,
    consistency: ReadConsistency,
) -> Result<(Key, E), InternalError> {
    let mut entity: E = row.try_decode(max_row_bytes).map_err(|err| {
        InternalError::store_corruption(format!(
            "entity '{}' row {key} failed to decode: {err}",
            E::PATH
        ))
    })?;

    if entity.primary_key().as_ref() != Some(&key) {
        return Err(InternalError::store_corruption(format!(
            "entity '{}' row {key} decodes to key {:?}",
            E::PATH,
            entity.primary_key()
        )));
    }

    attach_relations(&mut entity, &key, registry, consistency)?;

    Ok((key, entity))
}
