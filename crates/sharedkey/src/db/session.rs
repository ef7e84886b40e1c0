use crate::error::Error;
use sharedkey_core::{
    self as core,
    db::{CommitResponse, Db, Joined, ReadConsistency, Response, UnitOfWork},
    key::Key,
    obs::MetricsSink,
    traits::{DerivedEntity, EntityKind},
    types::Ref,
};

///
/// DbSession
/// Public facade session wrapper.
/// Converts core errors into `sharedkey::Error`.
///

#[derive(Clone)]
pub struct DbSession {
    inner: core::db::DbSession,
}

impl DbSession {
    #[must_use]
    pub fn new(db: &Db) -> Self {
        Self {
            inner: db.session(),
        }
    }

    /// Enable debug logging for units of work and loads of this session.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.inner = self.inner.debug();
        self
    }

    /// Override the metrics sink for operations executed through this session.
    #[must_use]
    pub fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.inner = self.inner.metrics_sink(sink);
        self
    }

    #[must_use]
    pub fn consistency(mut self, consistency: ReadConsistency) -> Self {
        self.inner = self.inner.consistency(consistency);
        self
    }

    //
    // Writes
    //

    #[must_use]
    pub fn unit_of_work(&self) -> UnitOfWork {
        self.inner.unit_of_work()
    }

    /// Run `f` against a fresh unit of work and commit it.
    pub fn in_transaction(
        &self,
        f: impl FnOnce(&mut UnitOfWork) -> Result<(), Error>,
    ) -> Result<CommitResponse, Error> {
        let mut unit = self.inner.unit_of_work();
        f(&mut unit)?;

        Ok(unit.commit()?)
    }

    //
    // Reads
    //

    #[must_use]
    pub const fn load<E: EntityKind>(&self) -> SessionLoadQuery<'_, E> {
        SessionLoadQuery {
            inner: self.inner.load::<E>(),
        }
    }

    pub fn query<E: EntityKind>(&self, source: &str) -> Result<Response<E>, Error> {
        Ok(self.inner.query(source)?)
    }

    pub fn fetch<E: EntityKind>(&self, reference: &Ref<E>) -> Result<Option<E>, Error> {
        Ok(self.inner.fetch(reference)?)
    }

    pub fn load_with_parent<E: DerivedEntity>(
        &self,
        key: impl Into<Key>,
    ) -> Result<Option<Joined<E>>, Error> {
        Ok(self.inner.load_with_parent(key)?)
    }
}

///
/// SessionLoadQuery
///
/// Session-bound wrapper for load queries.
///

#[must_use]
pub struct SessionLoadQuery<'a, E: EntityKind> {
    inner: core::db::LoadQuery<'a, E>,
}

impl<E: EntityKind> SessionLoadQuery<'_, E> {
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.inner = self.inner.key(key);
        self
    }

    pub fn keys<K: Into<Key>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.inner = self.inner.keys(keys);
        self
    }

    pub fn all(mut self) -> Self {
        self.inner = self.inner.all();
        self
    }

    pub fn consistency(mut self, consistency: ReadConsistency) -> Self {
        self.inner = self.inner.consistency(consistency);
        self
    }

    pub fn execute(self) -> Result<Response<E>, Error> {
        Ok(self.inner.execute()?)
    }

    /// Execute and require exactly one row.
    pub fn entity(self) -> Result<E, Error> {
        Ok(self.inner.execute()?.entity()?)
    }

    /// Execute and return the row, if any.
    pub fn try_entity(self) -> Result<Option<E>, Error> {
        Ok(self.inner.execute()?.try_entity()?)
    }
}
