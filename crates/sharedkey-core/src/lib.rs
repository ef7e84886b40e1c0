//! Core runtime for sharedkey: entity traits, mapping models, the identity
//! mapper, units of work, and the ergonomics exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod key;
pub mod model;
pub mod obs;
pub mod serialize;
pub mod traits;
pub mod types;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use config::{DbConfig, MAX_ROW_BYTES};

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors, stores, or serializers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{Db, DbSession, ReadConsistency, SaveMode},
        key::{Key, KeyKind},
        model::{EntityModel, FieldKind, FieldModel, IdentityModel, RelationModel},
        traits::{DerivedEntity, EntityKind, Path},
        types::{DerivedKey, Handle, Ref, RefTarget},
    };
}
