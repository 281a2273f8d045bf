//! Command enum defining all datastore operations.
//!
//! Commands are the "instruction set" of the datastore protocol. Every
//! operation that can be sent to the datastore is a variant of this enum.
//!
//! Commands are:
//! - **Self-contained**: the request descriptor carries every parameter
//! - **Serializable**: can be converted to/from JSON
//! - **Comparable**: equal commands produce identical wire payloads
//! - **Pure data**: building one never fails and never touches the network

use datastore_core::{
    AggregateRequest, FilterRequest, GetAllRequest, GetManyByFqidsRequest, GetManyRequest,
    GetRequest, ReserveIdsRequest, WriteRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A command is a self-contained, serializable datastore operation.
///
/// # Command Categories
///
/// | Category | Count | Description |
/// |----------|-------|-------------|
/// | Read | 9 | Point reads, batched reads, scans, filters, aggregates |
/// | Write | 2 | Atomic write, id reservation |
///
/// # Example
///
/// ```
/// use datastore_core::{Collection, Filter, FilterRequest};
/// use datastore_executor::Command;
/// use serde_json::json;
///
/// let cmd = Command::Count(FilterRequest::new(
///     Collection::new("topic").unwrap(),
///     Filter::eq("meeting_id", 5),
/// ));
///
/// assert_eq!(cmd.name(), "count");
/// assert_eq!(
///     cmd.data(),
///     json!({
///         "collection": "topic",
///         "filter": {"field": "meeting_id", "value": 5, "operator": "="},
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    // ==================== Read (9) ====================
    /// Read one entity.
    /// Returns: `Output::Model`
    Get(GetRequest),

    /// Read entities of several collections.
    /// Returns: `Output::ModelMap`
    GetMany(GetManyRequest),

    /// Read entities addressed by FQID.
    /// Returns: `Output::ModelMap`
    GetManyByFqids(GetManyByFqidsRequest),

    /// Read every entity of a collection.
    /// Returns: `Output::Models`
    GetAll(GetAllRequest),

    /// Read the entities matching a filter.
    /// Returns: `Output::Models`
    Filter(FilterRequest),

    /// Check whether any entity matches a filter.
    /// Returns: `Output::Found`
    Exists(FilterRequest),

    /// Count the entities matching a filter.
    /// Returns: `Output::Count`
    Count(FilterRequest),

    /// Smallest value of a field over matching entities.
    /// Returns: `Output::Aggregate`
    Min(AggregateRequest),

    /// Largest value of a field over matching entities.
    /// Returns: `Output::Aggregate`
    Max(AggregateRequest),

    // ==================== Write (2) ====================
    /// Apply a write request element atomically.
    /// Returns: `Output::Unit`
    Write(WriteRequest),

    /// Allocate fresh ids in a collection.
    /// Returns: `Output::Ids`
    ReserveIds(ReserveIdsRequest),
}

impl Command {
    /// Protocol name of the operation (also its endpoint)
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get(_) => "get",
            Command::GetMany(_) | Command::GetManyByFqids(_) => "get_many",
            Command::GetAll(_) => "get_all",
            Command::Filter(_) => "filter",
            Command::Exists(_) => "exists",
            Command::Count(_) => "count",
            Command::Min(_) => "min",
            Command::Max(_) => "max",
            Command::Write(_) => "write",
            Command::ReserveIds(_) => "reserve_ids",
        }
    }

    /// Wire payload of the command
    pub fn data(&self) -> Value {
        match self {
            Command::Get(r) => r.data(),
            Command::GetMany(r) => r.data(),
            Command::GetManyByFqids(r) => r.data(),
            Command::GetAll(r) => r.data(),
            Command::Filter(r) | Command::Exists(r) | Command::Count(r) => r.data(),
            Command::Min(r) | Command::Max(r) => r.data(),
            Command::Write(r) => r.data(),
            Command::ReserveIds(r) => r.data(),
        }
    }

    /// Whether the command goes to the writer
    pub fn is_write(&self) -> bool {
        matches!(self, Command::Write(_) | Command::ReserveIds(_))
    }
}
