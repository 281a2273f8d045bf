//! Optimistic concurrency for datastore writes
//!
//! This crate decides whether a write request element may be applied:
//! - FieldPositions: source of current per-field change positions
//! - Locked-field validation with conflict collection
//! - Conversion of conflicts into the writer-facing error
//!
//! There is no locking here. Writers read, assert the positions they read
//! at, and the datastore applies the write only if every assertion holds.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod validation;

pub use validation::{
    validate_locked_fields, validate_write, ConflictType, FieldPositions, ValidationResult,
};
