//! Request descriptors for the datastore protocol
//!
//! One immutable descriptor per operation kind. Each exposes `data()`, the
//! literal JSON body sent to the remote datastore. `data()` is a pure
//! function of the descriptor's fields: equal descriptors compare equal and
//! produce identical payloads.
//!
//! Optional read options (`position`, `get_deleted_models`, `type`) are only
//! present in the payload when set. `mapped_fields` on `get` / `get_all` is
//! always present and `null` when no projection is requested.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Error;
use crate::filter::Filter;
use crate::types::{Collection, EntityId, Fqid, Position};
use crate::write::WriteRequestElement;

// =============================================================================
// Read options
// =============================================================================

/// Which models a read returns with respect to deletion
///
/// Serialized as the protocol's integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DeletedModelsBehaviour {
    /// Only models that are not deleted (code 1)
    #[default]
    NoDeleted,
    /// Only deleted models (code 2)
    OnlyDeleted,
    /// Every model (code 3)
    AllModels,
}

impl DeletedModelsBehaviour {
    /// Protocol code
    pub fn code(&self) -> u8 {
        match self {
            DeletedModelsBehaviour::NoDeleted => 1,
            DeletedModelsBehaviour::OnlyDeleted => 2,
            DeletedModelsBehaviour::AllModels => 3,
        }
    }

    /// Whether a model with the given deletion flag is visible
    pub fn admits(&self, deleted: bool) -> bool {
        match self {
            DeletedModelsBehaviour::NoDeleted => !deleted,
            DeletedModelsBehaviour::OnlyDeleted => deleted,
            DeletedModelsBehaviour::AllModels => true,
        }
    }
}

impl TryFrom<u8> for DeletedModelsBehaviour {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        match code {
            1 => Ok(DeletedModelsBehaviour::NoDeleted),
            2 => Ok(DeletedModelsBehaviour::OnlyDeleted),
            3 => Ok(DeletedModelsBehaviour::AllModels),
            other => Err(Error::Serialization(format!(
                "unknown get_deleted_models code {}",
                other
            ))),
        }
    }
}

impl From<DeletedModelsBehaviour> for u8 {
    fn from(b: DeletedModelsBehaviour) -> Self {
        b.code()
    }
}

/// Optional read parameters shared by `get`, `get_many` and `get_all`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Read the state as of this position instead of the latest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Deletion filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_deleted_models: Option<DeletedModelsBehaviour>,
}

impl ReadOptions {
    /// Read as of a position
    pub fn at(position: Position) -> Self {
        ReadOptions {
            position: Some(position),
            get_deleted_models: None,
        }
    }

    /// Set the deletion filter
    pub fn with_deleted(mut self, behaviour: DeletedModelsBehaviour) -> Self {
        self.get_deleted_models = Some(behaviour);
        self
    }

    fn write_into(&self, payload: &mut Map<String, Value>) {
        if let Some(position) = self.position {
            payload.insert("position".to_string(), json!(position.as_u64()));
        }
        if let Some(behaviour) = self.get_deleted_models {
            payload.insert("get_deleted_models".to_string(), json!(behaviour.code()));
        }
    }
}

/// Ordering semantics for `min` / `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateType {
    /// Numeric ordering over integers
    Int,
    /// Numeric ordering over floats
    Float,
    /// Lexicographic ordering
    Str,
}

impl AggregateType {
    /// Protocol name
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::Int => "int",
            AggregateType::Float => "float",
            AggregateType::Str => "str",
        }
    }
}

fn mapped_fields_value(mapped_fields: &Option<Vec<String>>) -> Value {
    match mapped_fields {
        Some(fields) => json!(fields),
        None => Value::Null,
    }
}

// =============================================================================
// Reads
// =============================================================================

/// Single-entity read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    /// Entity to read
    pub fqid: Fqid,
    /// Projection, `None` for all fields
    #[serde(default)]
    pub mapped_fields: Option<Vec<String>>,
    /// Read options
    #[serde(flatten)]
    pub options: ReadOptions,
}

impl GetRequest {
    /// Create a read of the latest state
    pub fn new(fqid: Fqid, mapped_fields: Option<Vec<String>>) -> Self {
        GetRequest {
            fqid,
            mapped_fields,
            options: ReadOptions::default(),
        }
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("fqid".to_string(), json!(self.fqid.to_string()));
        payload.insert(
            "mapped_fields".to_string(),
            mapped_fields_value(&self.mapped_fields),
        );
        self.options.write_into(&mut payload);
        Value::Object(payload)
    }
}

/// One collection's share of a batched read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRequest {
    /// Collection to read from
    pub collection: Collection,
    /// Ids to read
    pub ids: Vec<EntityId>,
    /// Projection; falls back to the batch-level projection when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_fields: Option<Vec<String>>,
}

impl CollectionRequest {
    /// Create a per-collection request
    pub fn new(collection: Collection, ids: Vec<EntityId>, mapped_fields: Option<Vec<String>>) -> Self {
        CollectionRequest {
            collection,
            ids,
            mapped_fields,
        }
    }

    /// Wire form of this entry
    pub fn to_value(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("collection".to_string(), json!(self.collection.as_str()));
        entry.insert("ids".to_string(), json!(self.ids));
        if let Some(fields) = &self.mapped_fields {
            entry.insert("mapped_fields".to_string(), json!(fields));
        }
        Value::Object(entry)
    }

    /// Effective projection given the batch-level fallback
    pub fn effective_fields<'a>(&'a self, fallback: &'a Option<Vec<String>>) -> Option<&'a [String]> {
        self.mapped_fields
            .as_deref()
            .or(fallback.as_deref())
    }
}

/// Batched heterogeneous read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetManyRequest {
    /// Per-collection requests
    pub requests: Vec<CollectionRequest>,
    /// Batch-level projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_fields: Option<Vec<String>>,
    /// Read options
    #[serde(flatten)]
    pub options: ReadOptions,
}

impl GetManyRequest {
    /// Create a batched read of the latest state
    pub fn new(requests: Vec<CollectionRequest>, mapped_fields: Option<Vec<String>>) -> Self {
        GetManyRequest {
            requests,
            mapped_fields,
            options: ReadOptions::default(),
        }
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        let mut payload = Map::new();
        payload.insert(
            "requests".to_string(),
            Value::Array(self.requests.iter().map(CollectionRequest::to_value).collect()),
        );
        if let Some(fields) = &self.mapped_fields {
            payload.insert("mapped_fields".to_string(), json!(fields));
        }
        self.options.write_into(&mut payload);
        Value::Object(payload)
    }
}

/// Batched read addressed by FQID strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetManyByFqidsRequest {
    /// Entities to read
    #[serde(rename = "requests")]
    pub ids: Vec<Fqid>,
}

impl GetManyByFqidsRequest {
    /// Create a read of the given entities
    pub fn new(ids: Vec<Fqid>) -> Self {
        GetManyByFqidsRequest { ids }
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        let requests: Vec<String> = self.ids.iter().map(|fqid| fqid.to_string()).collect();
        json!({ "requests": requests })
    }
}

/// Unfiltered scan of one collection
///
/// Meant for small reference collections; the cost grows with the
/// collection size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllRequest {
    /// Collection to scan
    pub collection: Collection,
    /// Projection, `None` for all fields
    #[serde(default)]
    pub mapped_fields: Option<Vec<String>>,
    /// Deletion filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_deleted_models: Option<DeletedModelsBehaviour>,
}

impl GetAllRequest {
    /// Create a scan
    pub fn new(collection: Collection, mapped_fields: Option<Vec<String>>) -> Self {
        GetAllRequest {
            collection,
            mapped_fields,
            get_deleted_models: None,
        }
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("collection".to_string(), json!(self.collection.as_str()));
        payload.insert(
            "mapped_fields".to_string(),
            mapped_fields_value(&self.mapped_fields),
        );
        if let Some(behaviour) = self.get_deleted_models {
            payload.insert("get_deleted_models".to_string(), json!(behaviour.code()));
        }
        Value::Object(payload)
    }
}

/// Collection plus filter, the payload of `filter`, `exists` and `count`
///
/// `mapped_fields` is only sent when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRequest {
    /// Collection to query
    pub collection: Collection,
    /// Predicate over the collection's models
    pub filter: Filter,
    /// Projection of the returned models; only meaningful for `filter`
    ///
    /// Applied by the reader to the returned models. It is not part of the
    /// wire payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_fields: Option<Vec<String>>,
}

impl FilterRequest {
    /// Create a filtered query
    pub fn new(collection: Collection, filter: Filter) -> Self {
        FilterRequest {
            collection,
            filter,
            mapped_fields: None,
        }
    }

    /// Restrict the returned models to the given fields
    pub fn with_mapped_fields(mut self, mapped_fields: Option<Vec<String>>) -> Self {
        self.mapped_fields = mapped_fields;
        self
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("collection".to_string(), json!(self.collection.as_str()));
        payload.insert("filter".to_string(), self.filter.to_value());
        Value::Object(payload)
    }
}

/// Payload of `min` and `max`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateRequest {
    /// Collection to query
    pub collection: Collection,
    /// Predicate selecting the aggregated models
    pub filter: Filter,
    /// Field to aggregate
    pub field: String,
    /// Ordering semantics, when the field's type is ambiguous
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub aggregate_type: Option<AggregateType>,
}

impl AggregateRequest {
    /// Create an aggregate query
    pub fn new(
        collection: Collection,
        filter: Filter,
        field: impl Into<String>,
        aggregate_type: Option<AggregateType>,
    ) -> Self {
        AggregateRequest {
            collection,
            filter,
            field: field.into(),
            aggregate_type,
        }
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("collection".to_string(), json!(self.collection.as_str()));
        payload.insert("filter".to_string(), self.filter.to_value());
        payload.insert("field".to_string(), json!(self.field));
        if let Some(aggregate_type) = self.aggregate_type {
            payload.insert("type".to_string(), json!(aggregate_type.as_str()));
        }
        Value::Object(payload)
    }
}

// =============================================================================
// Writes
// =============================================================================

/// The sole mutating request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteRequest {
    /// Element to apply atomically
    pub write_request: WriteRequestElement,
}

impl WriteRequest {
    /// Wrap an element
    pub fn new(write_request: WriteRequestElement) -> Self {
        WriteRequest { write_request }
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        self.write_request.to_value()
    }
}

/// Allocation of fresh ids in one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReserveIdsRequest {
    /// Collection the ids belong to
    pub collection: Collection,
    /// How many ids to allocate
    pub number: u64,
}

impl ReserveIdsRequest {
    /// Create an allocation request
    pub fn new(collection: Collection, number: u64) -> Self {
        ReserveIdsRequest { collection, number }
    }

    /// Wire payload
    pub fn data(&self) -> Value {
        json!({
            "collection": self.collection.as_str(),
            "number": self.number,
        })
    }
}
