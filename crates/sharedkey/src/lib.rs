//! ## Crate layout
//! - `core`: runtime model, identity mapper, units of work, loads, and
//!   observability.
//! - `db`: session facade returning the public [`Error`].
//! - `error`: stable public error taxonomy.
//!
//! The `prelude` module carries the vocabulary needed to declare entities
//! and run sessions.

pub use sharedkey_core as core;

pub mod db;
pub mod error;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        core::{
            DbConfig,
            db::{CommitResponse, Db, Joined, ReadConsistency, Response, SaveMode, UnitOfWork},
            key::{Key, KeyKind},
            model::{EntityModel, FieldKind, FieldModel, IdentityModel, RelationModel},
            traits::{DerivedEntity, EntityKind, Path},
            types::{DerivedKey, Handle, Ref, RefTarget},
        },
        db::DbSession,
        error::Error,
    };
    pub use serde::{Deserialize, Serialize};
}
