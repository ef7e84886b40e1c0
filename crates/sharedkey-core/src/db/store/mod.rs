//! Module: store
//! Responsibility: per-entity ordered row storage and the registry that owns it.
//! Does not own: row encoding policy, relation checks, or commit sequencing.

mod data;
mod registry;


pub use data::{DataStore, RawRow, RawRowError, RowDecodeError};
pub use registry::{StoreRegistry, StoreRegistryError};
