//! Datastore adapter: the typed façade the action layer talks to.
//!
//! Every method builds exactly one [`Command`], runs it through the
//! [`Executor`] and unwraps the matching [`Output`] variant. Nothing is
//! cached and filters are not checked beyond their structural validity;
//! failures propagate unchanged.

use std::sync::Arc;

use datastore_core::{
    Aggregate, AggregateRequest, AggregateType, Collection, CollectionRequest, Count,
    DeletedModelsBehaviour, EntityId, Filter, FilterRequest, Found, Fqid, GetAllRequest,
    GetManyByFqidsRequest, GetManyRequest, GetRequest, ModelMap, PartialModel, ReadOptions,
    ReserveIdsRequest, WriteRequest, WriteRequestElement,
};
use datastore_engine::{DatastoreConfig, Reader, Writer};
use tracing::debug;

use crate::{Command, Error, Executor, Output, Result};

/// Read and write access to the datastore, one method per operation.
///
/// Actions receive a `&dyn Datastore`, so tests can hand them any
/// implementation.
pub trait Datastore: Send + Sync {
    /// Read one entity, optionally projected to `mapped_fields`
    fn get(
        &self,
        fqid: &Fqid,
        mapped_fields: Option<Vec<String>>,
        options: ReadOptions,
    ) -> Result<PartialModel>;

    /// Batched read over several collections
    fn get_many(
        &self,
        requests: Vec<CollectionRequest>,
        mapped_fields: Option<Vec<String>>,
        options: ReadOptions,
    ) -> Result<ModelMap>;

    /// Batched read addressed by FQID
    fn get_many_by_fqids(&self, ids: Vec<Fqid>) -> Result<ModelMap>;

    /// Every entity of a collection
    fn get_all(
        &self,
        collection: &Collection,
        mapped_fields: Option<Vec<String>>,
        get_deleted_models: Option<DeletedModelsBehaviour>,
    ) -> Result<Vec<PartialModel>>;

    /// Entities of `collection` matching `filter`
    ///
    /// `meeting_id` is a scoping hint for the remote side and is not
    /// enforced here.
    fn filter(
        &self,
        collection: &Collection,
        filter: Filter,
        meeting_id: Option<EntityId>,
        mapped_fields: Option<Vec<String>>,
    ) -> Result<Vec<PartialModel>>;

    /// Whether any entity of `collection` matches `filter`
    fn exists(&self, collection: &Collection, filter: Filter) -> Result<Found>;

    /// Number of entities of `collection` matching `filter`
    fn count(&self, collection: &Collection, filter: Filter) -> Result<Count>;

    /// Smallest value of `field` over the matching entities
    fn min(
        &self,
        collection: &Collection,
        filter: Filter,
        field: &str,
        aggregate_type: Option<AggregateType>,
    ) -> Result<Aggregate>;

    /// Largest value of `field` over the matching entities
    fn max(
        &self,
        collection: &Collection,
        filter: Filter,
        field: &str,
        aggregate_type: Option<AggregateType>,
    ) -> Result<Aggregate>;

    /// Apply a write request element atomically
    fn write(&self, element: WriteRequestElement) -> Result<()>;

    /// Allocate `number` fresh ids in `collection`
    fn reserve_ids(&self, collection: &Collection, number: u64) -> Result<Vec<EntityId>>;
}

/// [`Datastore`] implementation over an [`Executor`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use datastore_core::{Collection, Filter, WriteRequestBuilder};
/// use datastore_engine::MemoryDatastore;
/// use datastore_executor::{Adapter, Datastore};
/// use serde_json::json;
///
/// let store = Arc::new(MemoryDatastore::new());
/// let adapter = Adapter::new(store.clone(), store);
/// let topic = Collection::new("topic").unwrap();
///
/// let ids = adapter.reserve_ids(&topic, 1).unwrap();
/// let element = WriteRequestBuilder::new(1)
///     .create(topic.fqid(ids[0]), [("meeting_id".to_string(), json!(5))])
///     .build();
/// adapter.write(element).unwrap();
///
/// let count = adapter.count(&topic, Filter::eq("meeting_id", 5)).unwrap();
/// assert_eq!(count.count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Adapter {
    executor: Executor,
}

impl Adapter {
    /// Create an adapter over a reader and a writer
    pub fn new(reader: Arc<dyn Reader>, writer: Arc<dyn Writer>) -> Self {
        Self::from_executor(Executor::new(reader, writer))
    }

    /// Wrap an existing executor
    pub fn from_executor(executor: Executor) -> Self {
        Adapter { executor }
    }

    /// Create an adapter talking HTTP to the configured datastore
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the configuration is invalid.
    pub fn connect(config: &DatastoreConfig) -> Result<Self> {
        let (reader, writer) = datastore_engine::connect(config)?;
        Ok(Self::new(Arc::new(reader), Arc::new(writer)))
    }

    /// The executor commands are run through
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    fn run(&self, command: Command) -> Result<Output> {
        debug!(
            target: "datastore::adapter",
            command = command.name(),
            data = %command.data(),
            "Start request to datastore with the following data"
        );
        self.executor.execute(command)
    }
}

fn unexpected(command: &str) -> Error {
    Error::Internal {
        reason: format!("Unexpected output for {}", command),
    }
}

impl Datastore for Adapter {
    // =========================================================================
    // Reads
    // =========================================================================

    fn get(
        &self,
        fqid: &Fqid,
        mapped_fields: Option<Vec<String>>,
        options: ReadOptions,
    ) -> Result<PartialModel> {
        let mut request = GetRequest::new(fqid.clone(), mapped_fields);
        request.options = options;
        match self.run(Command::Get(request))? {
            Output::Model(model) => Ok(model),
            _ => Err(unexpected("Get")),
        }
    }

    fn get_many(
        &self,
        requests: Vec<CollectionRequest>,
        mapped_fields: Option<Vec<String>>,
        options: ReadOptions,
    ) -> Result<ModelMap> {
        let mut request = GetManyRequest::new(requests, mapped_fields);
        request.options = options;
        match self.run(Command::GetMany(request))? {
            Output::ModelMap(models) => Ok(models),
            _ => Err(unexpected("GetMany")),
        }
    }

    fn get_many_by_fqids(&self, ids: Vec<Fqid>) -> Result<ModelMap> {
        match self.run(Command::GetManyByFqids(GetManyByFqidsRequest::new(ids)))? {
            Output::ModelMap(models) => Ok(models),
            _ => Err(unexpected("GetManyByFqids")),
        }
    }

    fn get_all(
        &self,
        collection: &Collection,
        mapped_fields: Option<Vec<String>>,
        get_deleted_models: Option<DeletedModelsBehaviour>,
    ) -> Result<Vec<PartialModel>> {
        let mut request = GetAllRequest::new(collection.clone(), mapped_fields);
        request.get_deleted_models = get_deleted_models;
        match self.run(Command::GetAll(request))? {
            Output::Models(models) => Ok(models),
            _ => Err(unexpected("GetAll")),
        }
    }

    fn filter(
        &self,
        collection: &Collection,
        filter: Filter,
        meeting_id: Option<EntityId>,
        mapped_fields: Option<Vec<String>>,
    ) -> Result<Vec<PartialModel>> {
        if let Some(meeting_id) = meeting_id {
            debug!(target: "datastore::adapter", %collection, meeting_id, "Filter scoped to meeting");
        }
        let request = FilterRequest::new(collection.clone(), filter).with_mapped_fields(mapped_fields);
        match self.run(Command::Filter(request))? {
            Output::Models(models) => Ok(models),
            _ => Err(unexpected("Filter")),
        }
    }

    fn exists(&self, collection: &Collection, filter: Filter) -> Result<Found> {
        let request = FilterRequest::new(collection.clone(), filter);
        match self.run(Command::Exists(request))? {
            Output::Found(found) => Ok(found),
            _ => Err(unexpected("Exists")),
        }
    }

    fn count(&self, collection: &Collection, filter: Filter) -> Result<Count> {
        let request = FilterRequest::new(collection.clone(), filter);
        match self.run(Command::Count(request))? {
            Output::Count(count) => Ok(count),
            _ => Err(unexpected("Count")),
        }
    }

    fn min(
        &self,
        collection: &Collection,
        filter: Filter,
        field: &str,
        aggregate_type: Option<AggregateType>,
    ) -> Result<Aggregate> {
        let request = AggregateRequest::new(collection.clone(), filter, field, aggregate_type);
        match self.run(Command::Min(request))? {
            Output::Aggregate(aggregate) => Ok(aggregate),
            _ => Err(unexpected("Min")),
        }
    }

    fn max(
        &self,
        collection: &Collection,
        filter: Filter,
        field: &str,
        aggregate_type: Option<AggregateType>,
    ) -> Result<Aggregate> {
        let request = AggregateRequest::new(collection.clone(), filter, field, aggregate_type);
        match self.run(Command::Max(request))? {
            Output::Aggregate(aggregate) => Ok(aggregate),
            _ => Err(unexpected("Max")),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    fn write(&self, element: WriteRequestElement) -> Result<()> {
        match self.run(Command::Write(WriteRequest::new(element)))? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("Write")),
        }
    }

    fn reserve_ids(&self, collection: &Collection, number: u64) -> Result<Vec<EntityId>> {
        let request = ReserveIdsRequest::new(collection.clone(), number);
        match self.run(Command::ReserveIds(request))? {
            Output::Ids(ids) => Ok(ids),
            _ => Err(unexpected("ReserveIds")),
        }
    }
}
