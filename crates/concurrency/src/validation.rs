//! Locked-field validation for optimistic writes
//!
//! A write request element carries `locked_fields`: for each FQField, the
//! position at which the writer observed it. Validation decides whether
//! those observations still hold.
//!
//! Key rules:
//! - A locked field conflicts when its current change position is greater
//!   than the asserted position (it moved after the writer read it)
//! - A field that was never written is at position 0
//! - Locking the `deleted` sentinel detects concurrent creation or deletion
//!   of the whole model
//! - All conflicts are collected; a single one rejects the whole element
//! - Fields written but not locked never conflict (blind writes)

use datastore_core::{Error, FqField, Position, WriteRequestElement};
use std::collections::BTreeMap;

/// Source of current change positions per field
///
/// Implemented by whatever holds the authoritative state, e.g. the
/// in-memory datastore's committed field table.
pub trait FieldPositions {
    /// Position at which `fqfield` last changed, `None` if never written
    fn field_position(&self, fqfield: &FqField) -> Option<Position>;
}

impl FieldPositions for BTreeMap<FqField, Position> {
    fn field_position(&self, fqfield: &FqField) -> Option<Position> {
        self.get(fqfield).copied()
    }
}

/// Types of conflicts that can occur during write validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// A locked field changed after the asserted position
    LockedFieldMoved {
        /// The locked field
        fqfield: FqField,
        /// Position the writer asserted
        asserted: Position,
        /// Position of the field's latest change
        current: Position,
    },
}

impl ConflictType {
    /// The field this conflict is about
    pub fn fqfield(&self) -> &FqField {
        match self {
            ConflictType::LockedFieldMoved { fqfield, .. } => fqfield,
        }
    }
}

/// Result of write validation
///
/// Accumulates all conflicts found during validation.
/// A write is applied only if is_valid() returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// Turn the result into the error the writer reports
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` naming every offending field if any
    /// conflict was found.
    pub fn into_result(self) -> datastore_core::Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        let message = self
            .conflicts
            .iter()
            .map(|c| match c {
                ConflictType::LockedFieldMoved {
                    fqfield,
                    asserted,
                    current,
                } => format!(
                    "{} locked at position {} was modified at position {}",
                    fqfield, asserted, current
                ),
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::Conflict {
            fqfields: self.conflicts.iter().map(|c| c.fqfield().clone()).collect(),
            message,
        })
    }
}

/// Validate locked fields against current positions
///
/// Conflicts are reported in FQField order.
pub fn validate_locked_fields<S: FieldPositions + ?Sized>(
    locked_fields: &BTreeMap<FqField, Position>,
    store: &S,
) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (fqfield, asserted) in locked_fields {
        let current = store.field_position(fqfield).unwrap_or(Position::ZERO);
        if current > *asserted {
            result.conflicts.push(ConflictType::LockedFieldMoved {
                fqfield: fqfield.clone(),
                asserted: *asserted,
                current,
            });
        }
    }

    result
}

/// Validate a whole write request element
///
/// Convenience wrapper over [`validate_locked_fields`] returning the
/// writer-facing error directly.
pub fn validate_write<S: FieldPositions + ?Sized>(
    element: &WriteRequestElement,
    store: &S,
) -> datastore_core::Result<()> {
    validate_locked_fields(element.locked_fields(), store).into_result()
}
