//! In-memory datastore
//!
//! A single-process implementation of both [`Reader`] and [`Writer`] with
//! the semantics of the remote datastore:
//!
//! - a global position that advances by exactly one per successful write
//! - per-field change positions, including the `deleted` sentinel
//! - full per-model history, so reads at an earlier `position` work
//! - per-collection id counters for `reserve_ids`
//! - writes validated against locked fields and event preconditions on a
//!   staged copy, committed all at once or not at all
//!
//! All state sits behind one `parking_lot::Mutex`; every call holds it for
//! its whole duration, which makes each write atomic and each read a
//! consistent snapshot.

mod eval;

pub use eval::{matches, order, values_equal};

use datastore_concurrency::validate_write;
use datastore_core::{
    Aggregate, AggregateRequest, Collection, Count, DeletedModelsBehaviour, EntityId, Error,
    Event, FilterRequest, FqField, Found, Fqid, GetAllRequest, GetManyByFqidsRequest,
    GetManyRequest, GetRequest, ModelMap, PartialModel, Position, ReserveIdsRequest, Result,
    WriteRequest,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::traits::{Reader, Writer};

/// Largest number of ids one `reserve_ids` call may allocate
pub const MAX_RESERVE_IDS: u64 = 100_000;

/// One version of a model
#[derive(Debug, Clone, PartialEq)]
struct ModelVersion {
    fields: BTreeMap<String, Value>,
    deleted: bool,
    position: Position,
}

#[derive(Debug, Default)]
struct State {
    position: Position,
    /// Versions per model, ascending by position
    models: BTreeMap<Fqid, Vec<ModelVersion>>,
    field_positions: BTreeMap<FqField, Position>,
    id_counters: BTreeMap<Collection, EntityId>,
}

impl State {
    /// Version of a model visible at `at` (latest when `None`)
    fn version(&self, fqid: &Fqid, at: Option<Position>) -> Option<&ModelVersion> {
        let versions = self.models.get(fqid)?;
        match at {
            None => versions.last(),
            Some(at) => versions.iter().rev().find(|v| v.position <= at),
        }
    }

    fn check_position(&self, at: Option<Position>) -> Result<()> {
        match at {
            Some(at) if at > self.position => Err(Error::rejected(format!(
                "Position {} is in the future, the current position is {}",
                at, self.position
            ))),
            _ => Ok(()),
        }
    }

    /// Latest live versions of a collection
    fn live_models<'a>(
        &'a self,
        collection: &'a Collection,
    ) -> impl Iterator<Item = (&'a Fqid, &'a ModelVersion)> + 'a {
        self.models
            .iter()
            .filter(move |(fqid, _)| &fqid.collection == collection)
            .filter_map(|(fqid, versions)| versions.last().map(|v| (fqid, v)))
            .filter(|(_, v)| !v.deleted)
    }
}

fn project(version: &ModelVersion, mapped_fields: Option<&[String]>) -> PartialModel {
    let fields = match mapped_fields {
        None => version.fields.clone(),
        Some(names) => names
            .iter()
            .filter_map(|name| {
                version
                    .fields
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect(),
    };
    PartialModel::new(fields, version.deleted, version.position)
}

fn does_not_exist(fqid: &Fqid) -> Error {
    Error::rejected(format!("Model '{}' does not exist.", fqid))
}

/// In-memory implementation of the datastore protocol
///
/// # Example
///
/// ```
/// use datastore_core::{Collection, GetRequest, ReserveIdsRequest, WriteRequest, WriteRequestBuilder};
/// use datastore_engine::{MemoryDatastore, Reader, Writer};
/// use serde_json::json;
///
/// let store = MemoryDatastore::new();
/// let topic = Collection::new("topic").unwrap();
/// let ids = store.reserve_ids(&ReserveIdsRequest::new(topic.clone(), 1)).unwrap();
///
/// let element = WriteRequestBuilder::new(1)
///     .create(topic.fqid(ids[0]), [("title".to_string(), json!("Agenda"))])
///     .build();
/// store.write(&WriteRequest::new(element)).unwrap();
///
/// let model = store.get(&GetRequest::new(topic.fqid(ids[0]), None)).unwrap();
/// assert_eq!(model.get("title"), Some(&json!("Agenda")));
/// ```
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    state: Mutex<State>,
}

impl MemoryDatastore {
    /// Create an empty datastore at position 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current global position
    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    /// Position at which a field last changed (0 if never written)
    pub fn field_position(&self, fqfield: &FqField) -> Position {
        self.state
            .lock()
            .field_positions
            .get(fqfield)
            .copied()
            .unwrap_or(Position::ZERO)
    }

    fn filtered(&self, request: &FilterRequest) -> (Vec<PartialModel>, Position) {
        let state = self.state.lock();
        let models: Vec<PartialModel> = state
            .live_models(&request.collection)
            .filter(|(_, v)| matches(&request.filter, &v.fields))
            .map(|(_, v)| project(v, request.mapped_fields.as_deref()))
            .collect();
        (models, state.position)
    }

    fn aggregate(&self, request: &AggregateRequest, wanted: Ordering) -> Aggregate {
        let state = self.state.lock();
        let values: Vec<&Value> = state
            .live_models(&request.collection)
            .filter(|(_, v)| matches(&request.filter, &v.fields))
            .filter_map(|(_, v)| v.fields.get(&request.field))
            .filter(|value| eval::aggregatable(value, request.aggregate_type))
            .collect();
        Aggregate {
            value: eval::extreme(values, wanted).cloned(),
            position: state.position,
        }
    }
}

impl Reader for MemoryDatastore {
    fn get(&self, request: &GetRequest) -> Result<PartialModel> {
        let state = self.state.lock();
        state.check_position(request.options.position)?;
        let behaviour = request.options.get_deleted_models.unwrap_or_default();
        state
            .version(&request.fqid, request.options.position)
            .filter(|v| behaviour.admits(v.deleted))
            .map(|v| project(v, request.mapped_fields.as_deref()))
            .ok_or_else(|| does_not_exist(&request.fqid))
    }

    fn get_many(&self, request: &GetManyRequest) -> Result<ModelMap> {
        let state = self.state.lock();
        state.check_position(request.options.position)?;
        let behaviour = request.options.get_deleted_models.unwrap_or_default();

        let mut result = ModelMap::new();
        for entry in &request.requests {
            let fields = entry.effective_fields(&request.mapped_fields);
            let models = result.entry(entry.collection.clone()).or_default();
            for id in &entry.ids {
                let fqid = entry.collection.fqid(*id);
                if let Some(version) = state
                    .version(&fqid, request.options.position)
                    .filter(|v| behaviour.admits(v.deleted))
                {
                    models.insert(*id, project(version, fields));
                }
            }
        }
        Ok(result)
    }

    fn get_many_by_fqids(&self, request: &GetManyByFqidsRequest) -> Result<ModelMap> {
        let state = self.state.lock();
        let mut result = ModelMap::new();
        for fqid in &request.ids {
            if let Some(version) = state.version(fqid, None).filter(|v| !v.deleted) {
                result
                    .entry(fqid.collection.clone())
                    .or_default()
                    .insert(fqid.id, project(version, None));
            }
        }
        Ok(result)
    }

    fn get_all(&self, request: &GetAllRequest) -> Result<Vec<PartialModel>> {
        let state = self.state.lock();
        let behaviour = request
            .get_deleted_models
            .unwrap_or(DeletedModelsBehaviour::NoDeleted);
        Ok(state
            .models
            .iter()
            .filter(|(fqid, _)| fqid.collection == request.collection)
            .filter_map(|(_, versions)| versions.last())
            .filter(|v| behaviour.admits(v.deleted))
            .map(|v| project(v, request.mapped_fields.as_deref()))
            .collect())
    }

    fn filter(&self, request: &FilterRequest) -> Result<Vec<PartialModel>> {
        Ok(self.filtered(request).0)
    }

    fn exists(&self, request: &FilterRequest) -> Result<Found> {
        let (models, position) = self.filtered(request);
        Ok(Found {
            exists: !models.is_empty(),
            position,
        })
    }

    fn count(&self, request: &FilterRequest) -> Result<Count> {
        let (models, position) = self.filtered(request);
        Ok(Count {
            count: models.len() as u64,
            position,
        })
    }

    fn min(&self, request: &AggregateRequest) -> Result<Aggregate> {
        Ok(self.aggregate(request, Ordering::Less))
    }

    fn max(&self, request: &AggregateRequest) -> Result<Aggregate> {
        Ok(self.aggregate(request, Ordering::Greater))
    }
}

impl Writer for MemoryDatastore {
    fn write(&self, request: &WriteRequest) -> Result<()> {
        let element = &request.write_request;
        if element.events().is_empty() {
            return Err(Error::rejected("Write request contains no events."));
        }

        let mut state = self.state.lock();

        validate_write(element, &state.field_positions)?;

        let position = state.position.next();
        let mut staged: BTreeMap<Fqid, ModelVersion> = BTreeMap::new();
        let mut touched: BTreeMap<FqField, Position> = BTreeMap::new();

        for event in element.events() {
            let fqid = event.fqid();
            let current = match staged.get(fqid) {
                Some(version) => Some(version.clone()),
                None => state.version(fqid, None).cloned(),
            };
            let live = current.as_ref().filter(|v| !v.deleted);

            let next = match event {
                Event::Create { fields, .. } => {
                    if live.is_some() {
                        return Err(Error::rejected(format!(
                            "Model '{}' already exists.",
                            fqid
                        )));
                    }
                    ModelVersion {
                        fields: fields
                            .iter()
                            .filter(|(_, v)| !v.is_null())
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect(),
                        deleted: false,
                        position,
                    }
                }
                Event::Update { fields, .. } => {
                    let mut version = live.cloned().ok_or_else(|| does_not_exist(fqid))?;
                    for (name, value) in fields {
                        if value.is_null() {
                            version.fields.remove(name);
                        } else {
                            version.fields.insert(name.clone(), value.clone());
                        }
                    }
                    version.position = position;
                    version
                }
                Event::Delete { .. } => {
                    let mut version = live.cloned().ok_or_else(|| does_not_exist(fqid))?;
                    version.deleted = true;
                    version.position = position;
                    version
                }
            };

            match event {
                Event::Create { fields, .. } | Event::Update { fields, .. } => {
                    for name in fields.keys() {
                        touched.insert(fqid.field(name.clone())?, position);
                    }
                    if matches!(event, Event::Create { .. }) {
                        touched.insert(fqid.deleted_field(), position);
                    }
                }
                Event::Delete { .. } => {
                    for name in next.fields.keys() {
                        touched.insert(fqid.field(name.clone())?, position);
                    }
                    touched.insert(fqid.deleted_field(), position);
                }
            }

            staged.insert(fqid.clone(), next);
        }

        // Commit
        for (fqid, version) in staged {
            let counter = state.id_counters.entry(fqid.collection.clone()).or_insert(0);
            *counter = (*counter).max(fqid.id);
            state.models.entry(fqid).or_default().push(version);
        }
        state.field_positions.extend(touched);
        state.position = position;

        tracing::debug!(
            target: "datastore::memory",
            position = position.as_u64(),
            events = element.events().len(),
            user_id = element.user_id(),
            "Write committed"
        );
        Ok(())
    }

    fn reserve_ids(&self, request: &ReserveIdsRequest) -> Result<Vec<EntityId>> {
        if request.number > MAX_RESERVE_IDS {
            return Err(Error::rejected(format!(
                "Cannot reserve {} ids at once, the limit is {}",
                request.number, MAX_RESERVE_IDS
            )));
        }
        if request.number == 0 {
            return Ok(Vec::new());
        }
        let mut state = self.state.lock();
        let counter = state
            .id_counters
            .entry(request.collection.clone())
            .or_insert(0);
        let last = counter.checked_add(request.number).ok_or_else(|| {
            Error::rejected(format!(
                "Id space of collection {} is exhausted",
                request.collection
            ))
        })?;
        let first = *counter + 1;
        *counter = last;
        Ok((first..=last).collect())
    }
}
