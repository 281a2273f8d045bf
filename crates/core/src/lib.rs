//! Core types for the datastore client
//!
//! This crate defines the value types every other layer is built on:
//! - Addressing: Collection, Fqid, FqField, Position
//! - Filter: the filter expression language and its canonical encoding
//! - Model: PartialModel and the aggregate read results (Found, Count, Aggregate)
//! - Write: Event, WriteRequestElement, the builder and the merge rule
//! - Request: one descriptor per protocol operation, each with a `data()` payload
//! - Error: the structured error shared by the lower layers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod model;
pub mod request;
pub mod types;
pub mod write;

pub use error::{Error, Result};
pub use filter::{Comparison, Filter, FilterOperator, Operands};
pub use model::{Aggregate, Count, Found, ModelMap, PartialModel};
pub use request::{
    AggregateRequest, AggregateType, CollectionRequest, DeletedModelsBehaviour, FilterRequest,
    GetAllRequest, GetManyByFqidsRequest, GetManyRequest, GetRequest, ReadOptions,
    ReserveIdsRequest, WriteRequest,
};
pub use types::{Collection, EntityId, FqField, Fqid, Position, DELETED_FIELD, KEYSEPARATOR};
pub use write::{
    merge_write_request_elements, Event, EventType, PositionTracker, WriteRequestBuilder,
    WriteRequestElement,
};
