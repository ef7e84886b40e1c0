//! Module: session
//! Responsibility: per-caller entry point for units of work and loads.
//! Does not own: store state, which lives on `Db`.

use crate::{
    db::{
        Db, ReadConsistency,
        query::{Access, LoadQuery, execute_load, parse_query},
        response::Response,
        unit_of_work::{CommitResponse, UnitOfWork},
    },
    error::InternalError,
    key::Key,
    obs::sink::{MetricsSink, with_optional_sink},
    traits::{DerivedEntity, EntityKind},
    types::{Ref, RefTarget},
};

///
/// DbSession
///
/// Session-scoped options layered over a shared `Db`.
///

#[derive(Clone)]
pub struct DbSession {
    db: Db,
    debug: bool,
    consistency: ReadConsistency,
    metrics: Option<&'static dyn MetricsSink>,
}

impl DbSession {
    #[must_use]
    pub fn new(db: Db) -> Self {
        let config = db.config();
        let (debug, consistency) = (config.debug, config.read_consistency);

        Self {
            db,
            debug,
            consistency,
            metrics: None,
        }
    }

    /// Log flushes, commits and loads at debug level.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Route this session's metrics events to `sink`.
    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn consistency(mut self, consistency: ReadConsistency) -> Self {
        self.consistency = consistency;
        self
    }

    #[must_use]
    pub const fn read_consistency(&self) -> ReadConsistency {
        self.consistency
    }

    #[must_use]
    pub const fn db(&self) -> &Db {
        &self.db
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        with_optional_sink(self.metrics, f)
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.db.clone(), self.debug, self.metrics)
    }

    /// Run `f` against a fresh unit of work and commit it.
    ///
    /// Nothing is written when `f` or the commit fails.
    pub fn in_transaction(
        &self,
        f: impl FnOnce(&mut UnitOfWork) -> Result<(), InternalError>,
    ) -> Result<CommitResponse, InternalError> {
        let mut unit = self.unit_of_work();
        f(&mut unit)?;

        unit.commit()
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn load<E: EntityKind>(&self) -> LoadQuery<'_, E> {
        LoadQuery::new(self)
    }

    /// Run a textual query, e.g. `from Task where id = 'emp'`.
    pub fn query<E: EntityKind>(&self, source: &str) -> Result<Response<E>, InternalError> {
        let parsed = parse_query(source)?;
        let access = Access::from_text(E::MODEL, &parsed)?;

        self.execute_load(&access, self.consistency)
    }

    /// Load the row a reference points at.
    pub fn fetch<E: EntityKind>(&self, reference: &Ref<E>) -> Result<Option<E>, InternalError> {
        match reference.target() {
            RefTarget::Key(key) => self.load::<E>().key(key.clone()).execute()?.try_entity(),
            RefTarget::Pending(_) => Err(InternalError::executor_unsupported(format!(
                "reference to '{}' is pending and cannot be fetched before commit",
                E::PATH
            ))),
        }
    }

    /// Load a dependent together with the parent it shares its key with.
    pub fn load_with_parent<E: DerivedEntity>(
        &self,
        key: impl Into<Key>,
    ) -> Result<Option<Joined<E>>, InternalError> {
        let key = key.into();
        let Some(entity) = self.load::<E>().key(key.clone()).execute()?.try_entity()? else {
            return Ok(None);
        };

        let Some(parent) = self
            .load::<E::Parent>()
            .key(key.clone())
            .execute()?
            .try_entity()?
        else {
            return Err(InternalError::relation_corruption(format!(
                "entity '{}' row {key} has no parent row",
                E::PATH
            )));
        };

        Ok(Some(Joined { entity, parent }))
    }

    pub(crate) fn execute_load<E: EntityKind>(
        &self,
        access: &Access,
        consistency: ReadConsistency,
    ) -> Result<Response<E>, InternalError> {
        self.with_metrics(|| execute_load::<E>(&self.db, access, consistency, self.debug))
    }
}

///
/// Joined
///
/// A dependent and its parent, loaded under the same key.
///

#[derive(Clone, Debug)]
pub struct Joined<E: DerivedEntity> {
    pub entity: E,
    pub parent: E::Parent,
}
