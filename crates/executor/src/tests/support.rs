//! Recording Reader/Writer double.
//!
//! Every call is recorded as the [`Command`] that would carry it, so tests
//! can assert that the adapter handed the reader or writer exactly the
//! expected request.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use datastore_core::{
    Aggregate, AggregateRequest, Count, EntityId, FilterRequest, Found, GetAllRequest,
    GetManyByFqidsRequest, GetManyRequest, GetRequest, ModelMap, PartialModel, Position,
    ReserveIdsRequest, Result, WriteRequest,
};
use datastore_engine::{Reader, Writer};
use parking_lot::Mutex;

use crate::{Adapter, Command};

/// Position every canned response reports
pub const CANNED_POSITION: Position = Position::new(1);

#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Command>>,
    write_results: Mutex<VecDeque<Result<()>>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adapter over this recorder for both reads and writes
    pub fn adapter(self: &Arc<Self>) -> Adapter {
        Adapter::new(self.clone(), self.clone())
    }

    /// Script the outcome of the next writes; unscripted writes succeed
    pub fn push_write_result(&self, result: Result<()>) {
        self.write_results.lock().push_back(result);
    }

    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<Command> {
        self.calls.lock().last().cloned()
    }

    fn record(&self, command: Command) {
        self.calls.lock().push(command);
    }
}

fn canned_model() -> PartialModel {
    let mut fields = BTreeMap::new();
    fields.insert("f".to_string(), serde_json::json!(1));
    PartialModel::new(fields, false, CANNED_POSITION)
}

impl Reader for Recorder {
    fn get(&self, request: &GetRequest) -> Result<PartialModel> {
        self.record(Command::Get(request.clone()));
        Ok(canned_model())
    }

    fn get_many(&self, request: &GetManyRequest) -> Result<ModelMap> {
        self.record(Command::GetMany(request.clone()));
        Ok(ModelMap::new())
    }

    fn get_many_by_fqids(&self, request: &GetManyByFqidsRequest) -> Result<ModelMap> {
        self.record(Command::GetManyByFqids(request.clone()));
        Ok(ModelMap::new())
    }

    fn get_all(&self, request: &GetAllRequest) -> Result<Vec<PartialModel>> {
        self.record(Command::GetAll(request.clone()));
        Ok(vec![canned_model()])
    }

    fn filter(&self, request: &FilterRequest) -> Result<Vec<PartialModel>> {
        self.record(Command::Filter(request.clone()));
        Ok(vec![canned_model()])
    }

    fn exists(&self, request: &FilterRequest) -> Result<Found> {
        self.record(Command::Exists(request.clone()));
        Ok(Found {
            exists: true,
            position: CANNED_POSITION,
        })
    }

    fn count(&self, request: &FilterRequest) -> Result<Count> {
        self.record(Command::Count(request.clone()));
        Ok(Count {
            count: 1,
            position: CANNED_POSITION,
        })
    }

    fn min(&self, request: &AggregateRequest) -> Result<Aggregate> {
        self.record(Command::Min(request.clone()));
        Ok(Aggregate {
            value: Some(serde_json::json!(1)),
            position: CANNED_POSITION,
        })
    }

    fn max(&self, request: &AggregateRequest) -> Result<Aggregate> {
        self.record(Command::Max(request.clone()));
        Ok(Aggregate {
            value: Some(serde_json::json!(9)),
            position: CANNED_POSITION,
        })
    }
}

impl Writer for Recorder {
    fn write(&self, request: &WriteRequest) -> Result<()> {
        self.record(Command::Write(request.clone()));
        self.write_results.lock().pop_front().unwrap_or(Ok(()))
    }

    fn reserve_ids(&self, request: &ReserveIdsRequest) -> Result<Vec<EntityId>> {
        self.record(Command::ReserveIds(request.clone()));
        Ok((1..=request.number).collect())
    }
}
