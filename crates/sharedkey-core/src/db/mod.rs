//! Module: db
//! Responsibility: the in-process persistence runtime around the identity
//! mapper: stores, units of work, commits, loads and queries.

mod consistency;

pub(crate) mod commit;
pub mod identity;
pub mod query;
pub(crate) mod relation;
pub mod response;
pub mod session;
pub mod store;
pub mod unit_of_work;


pub use consistency::ReadConsistency;
pub use identity::{IdentityError, OrphanReason, resolve_derived_key};
pub use query::{LoadQuery, QueryError};
pub use response::{Response, ResponseError};
pub use session::{DbSession, Joined};
pub use unit_of_work::{CommitResponse, SaveMode, UnitOfWork};

use crate::{
    config::DbConfig,
    db::store::StoreRegistry,
    error::InternalError,
    model::{EntityModel, validate::validate_schema},
    traits::EntityKind,
};
use std::{cell::RefCell, rc::Rc};
use tracing::debug;

///
/// Db
///
/// Handle to one in-memory database. Clones share the same stores.
///

#[derive(Clone, Debug)]
pub struct Db {
    registry: Rc<RefCell<StoreRegistry>>,
    config: Rc<DbConfig>,
}

impl Db {
    #[must_use]
    pub fn builder() -> DbBuilder {
        DbBuilder::default()
    }

    /// Open a session using the configured defaults.
    #[must_use]
    pub fn session(&self) -> DbSession {
        DbSession::new(self.clone())
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Number of stored rows for entity `E`.
    pub fn row_count<E: EntityKind>(&self) -> Result<usize, InternalError> {
        self.with_registry(|registry| registry.try_get_store(E::PATH).map(|store| store.len()))
    }

    pub(crate) fn with_registry<R>(&self, f: impl FnOnce(&StoreRegistry) -> R) -> R {
        f(&self.registry.borrow())
    }

    pub(crate) fn with_registry_mut<R>(&self, f: impl FnOnce(&mut StoreRegistry) -> R) -> R {
        f(&mut self.registry.borrow_mut())
    }
}

///
/// DbBuilder
///
/// Collects entity models and configuration, then validates the schema.
///

#[derive(Debug, Default)]
pub struct DbBuilder {
    config: DbConfig,
    models: Vec<&'static EntityModel>,
}

impl DbBuilder {
    #[must_use]
    pub fn config(mut self, config: DbConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn entity<E: EntityKind>(mut self) -> Self {
        self.models.push(E::MODEL);
        self
    }

    /// Validate every registered model and create one store per entity.
    pub fn build(self) -> Result<Db, InternalError> {
        validate_schema(&self.models)?;

        let mut registry = StoreRegistry::new();
        for model in self.models.iter().copied() {
            registry.register(model)?;
        }

        debug!(
            entities = self.models.len(),
            debug = self.config.debug,
            "database built"
        );

        Ok(Db {
            registry: Rc::new(RefCell::new(registry)),
            config: Rc::new(self.config),
        })
    }
}
