pub mod entity;
pub mod field;
pub mod validate;

pub use entity::{EntityModel, IdentityModel};
pub use field::{FieldKind, FieldModel, RelationModel, RelationSide};
