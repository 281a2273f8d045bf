//! Read response types
//!
//! Every read carries the position at which its facts were true:
//! - [`PartialModel`] carries `meta_position` (and `meta_deleted`)
//! - [`Found`], [`Count`] and [`Aggregate`] carry `position`
//!
//! These metadata fields are preserved end to end. Callers lock the fields
//! they condition a write on at exactly these positions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Collection, EntityId, Position};

/// Field-selected snapshot of one entity plus its metadata
///
/// On the wire this is a flat JSON object: the selected fields side by side
/// with `meta_deleted` and `meta_position`.
///
/// ```
/// use datastore_core::PartialModel;
/// use serde_json::json;
///
/// let model: PartialModel = serde_json::from_value(json!({
///     "title": "Agenda",
///     "meta_deleted": false,
///     "meta_position": 12,
/// })).unwrap();
///
/// assert_eq!(model.get("title"), Some(&json!("Agenda")));
/// assert_eq!(model.meta_position.as_u64(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialModel {
    /// Whether the entity is deleted
    pub meta_deleted: bool,
    /// Position at which this snapshot was valid
    pub meta_position: Position,
    /// Selected fields
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl PartialModel {
    /// Create a snapshot
    pub fn new(fields: BTreeMap<String, Value>, meta_deleted: bool, meta_position: Position) -> Self {
        PartialModel {
            meta_deleted,
            meta_position,
            fields,
        }
    }

    /// Get one field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get one field as an integer
    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.fields.get(field).and_then(Value::as_u64)
    }

    /// Keep only the named fields; metadata is untouched
    pub fn project(mut self, mapped_fields: &[String]) -> Self {
        self.fields.retain(|name, _| mapped_fields.contains(name));
        self
    }
}

/// Batched read result: collection → id → snapshot
pub type ModelMap = BTreeMap<Collection, BTreeMap<EntityId, PartialModel>>;

/// Result of an `exists` query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Found {
    /// Whether at least one entity matched
    pub exists: bool,
    /// Position at which the query was evaluated
    pub position: Position,
}

/// Result of a `count` query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    /// Number of matching entities
    pub count: u64,
    /// Position at which the query was evaluated
    pub position: Position,
}

/// Result of a `min` / `max` query
///
/// `value` is `None` when no entity matched (or none carried the field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Aggregated value
    pub value: Option<Value>,
    /// Position at which the query was evaluated
    pub position: Position,
}
