//! Reader / Writer capability traits
//!
//! These traits are the boundary between the datastore client and whatever
//! actually holds the data: the HTTP transport for a remote datastore, or
//! the in-memory datastore used in tests and local tooling.
//!
//! Contract for every method:
//! - exactly one request of the matching kind in
//! - one round trip, no internal retries or batching
//! - the typed result, or the failure as reported (never swallowed)
//!
//! Implementations are shared between callers and must be safe for
//! concurrent use.

use datastore_core::{
    Aggregate, AggregateRequest, Count, EntityId, FilterRequest, Found, GetAllRequest,
    GetManyByFqidsRequest, GetManyRequest, GetRequest, ModelMap, PartialModel, ReserveIdsRequest,
    Result, WriteRequest,
};

/// Read side of the datastore protocol
pub trait Reader: Send + Sync {
    /// Read one entity
    fn get(&self, request: &GetRequest) -> Result<PartialModel>;

    /// Read entities of several collections in one round trip
    fn get_many(&self, request: &GetManyRequest) -> Result<ModelMap>;

    /// Read entities addressed by FQID in one round trip
    fn get_many_by_fqids(&self, request: &GetManyByFqidsRequest) -> Result<ModelMap>;

    /// Read every entity of a collection
    fn get_all(&self, request: &GetAllRequest) -> Result<Vec<PartialModel>>;

    /// Read the entities of a collection matching a filter
    fn filter(&self, request: &FilterRequest) -> Result<Vec<PartialModel>>;

    /// Check whether any entity matches a filter
    fn exists(&self, request: &FilterRequest) -> Result<Found>;

    /// Count the entities matching a filter
    fn count(&self, request: &FilterRequest) -> Result<Count>;

    /// Smallest value of a field over the matching entities
    fn min(&self, request: &AggregateRequest) -> Result<Aggregate>;

    /// Largest value of a field over the matching entities
    fn max(&self, request: &AggregateRequest) -> Result<Aggregate>;
}

/// Write side of the datastore protocol
pub trait Writer: Send + Sync {
    /// Apply a write request element atomically
    ///
    /// Fails with `Error::Conflict` if any locked field moved.
    fn write(&self, request: &WriteRequest) -> Result<()>;

    /// Allocate fresh ids in a collection
    fn reserve_ids(&self, request: &ReserveIdsRequest) -> Result<Vec<EntityId>>;
}
