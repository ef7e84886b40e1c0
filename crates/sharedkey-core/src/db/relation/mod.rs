//! Module: relation
//! Responsibility: shared-key relation semantics outside identity derivation.
//! Does not own: key derivation or pending-reference rewriting.
//! Boundary: read-path attachment for loads, delete blocking for commits.

mod attach;
mod delete;


pub(crate) use attach::attach_relations;
pub(crate) use delete::{order_removals, validate_removals};
