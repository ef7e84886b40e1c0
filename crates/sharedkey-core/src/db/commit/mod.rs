//! Module: commit
//! Responsibility: prepared row-op plans and their atomic application.
//! Does not own: identity resolution or relation validation; both run
//! before a marker is built.
//!
//! Invariants:
//! - A marker is fully prepared before any store mutation.
//! - Apply either lands every row op or restores every before-image.

mod apply;
mod guard;
mod marker;
mod prepare;


pub(crate) use apply::apply_marker;
pub(crate) use marker::{CommitMarker, CommitRowOp};
pub(crate) use prepare::prepare_marker;
