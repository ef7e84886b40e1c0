use crate::{
    db::store::DataStore,
    error::{ErrorClass, ErrorOrigin, InternalError},
    key::Key,
    model::EntityModel,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// StoreRegistryError
///

#[derive(Debug, ThisError)]
pub enum StoreRegistryError {
    #[error("store '{0}' not found")]
    StoreNotFound(String),

    #[error("store '{0}' already registered")]
    StoreAlreadyRegistered(String),
}

impl StoreRegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::StoreNotFound(_) => ErrorClass::Unsupported,
            Self::StoreAlreadyRegistered(_) => ErrorClass::InvariantViolation,
        }
    }
}

impl From<StoreRegistryError> for InternalError {
    fn from(err: StoreRegistryError) -> Self {
        Self::new(err.class(), ErrorOrigin::Store, err.to_string())
    }
}

///
/// StoreRegistry
///
/// One data store per registered entity path, plus the model that
/// describes its rows.
///

#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: BTreeMap<&'static str, DataStore>,
    models: BTreeMap<&'static str, &'static EntityModel>,
}

impl StoreRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity model and create its empty store.
    pub fn register(&mut self, model: &'static EntityModel) -> Result<(), InternalError> {
        if self.models.contains_key(model.path) {
            return Err(StoreRegistryError::StoreAlreadyRegistered(model.path.to_string()).into());
        }

        self.models.insert(model.path, model);
        self.stores.insert(model.path, DataStore::new());

        Ok(())
    }

    /// Iterate registered models in path order.
    pub fn models(&self) -> impl Iterator<Item = &'static EntityModel> + '_ {
        self.models.values().copied()
    }

    #[must_use]
    pub fn model(&self, path: &str) -> Option<&'static EntityModel> {
        self.models.get(path).copied()
    }

    /// Resolve an external entity name to its model.
    #[must_use]
    pub fn model_by_name(&self, name: &str) -> Option<&'static EntityModel> {
        self.models().find(|model| model.entity_name == name)
    }

    pub fn try_get_model(&self, path: &str) -> Result<&'static EntityModel, InternalError> {
        self.model(path)
            .ok_or_else(|| InternalError::unsupported_entity_path(path))
    }

    pub fn try_get_store(&self, path: &str) -> Result<&DataStore, InternalError> {
        self.stores
            .get(path)
            .ok_or_else(|| StoreRegistryError::StoreNotFound(path.to_string()).into())
    }

    pub fn try_get_store_mut(&mut self, path: &str) -> Result<&mut DataStore, InternalError> {
        self.stores
            .get_mut(path)
            .ok_or_else(|| StoreRegistryError::StoreNotFound(path.to_string()).into())
    }

    /// Whether a row is stored under `key` for entity `path`.
    #[must_use]
    pub fn contains(&self, path: &str, key: &Key) -> bool {
        self.stores
            .get(path)
            .is_some_and(|store| store.contains_key(key))
    }

    /// Total number of rows across all stores.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.stores.values().map(|store| store.len()).sum()
    }
}
