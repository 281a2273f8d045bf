//! Read command handlers.
//!
//! Each handler forwards its request descriptor unchanged to the reader and
//! wraps the result in the matching [`Output`] variant.

use datastore_core::{
    AggregateRequest, FilterRequest, GetAllRequest, GetManyByFqidsRequest, GetManyRequest,
    GetRequest,
};
use datastore_engine::Reader;

use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle Get command.
pub fn get(reader: &dyn Reader, request: &GetRequest) -> Result<Output> {
    let model = convert_result(reader.get(request))?;
    Ok(Output::Model(model))
}

/// Handle GetMany command.
pub fn get_many(reader: &dyn Reader, request: &GetManyRequest) -> Result<Output> {
    let models = convert_result(reader.get_many(request))?;
    Ok(Output::ModelMap(models))
}

/// Handle GetManyByFqids command.
pub fn get_many_by_fqids(reader: &dyn Reader, request: &GetManyByFqidsRequest) -> Result<Output> {
    let models = convert_result(reader.get_many_by_fqids(request))?;
    Ok(Output::ModelMap(models))
}

/// Handle GetAll command.
pub fn get_all(reader: &dyn Reader, request: &GetAllRequest) -> Result<Output> {
    let models = convert_result(reader.get_all(request))?;
    Ok(Output::Models(models))
}

/// Handle Filter command.
pub fn filter(reader: &dyn Reader, request: &FilterRequest) -> Result<Output> {
    let models = convert_result(reader.filter(request))?;
    Ok(Output::Models(models))
}

/// Handle Exists command.
pub fn exists(reader: &dyn Reader, request: &FilterRequest) -> Result<Output> {
    let found = convert_result(reader.exists(request))?;
    Ok(Output::Found(found))
}

/// Handle Count command.
pub fn count(reader: &dyn Reader, request: &FilterRequest) -> Result<Output> {
    let count = convert_result(reader.count(request))?;
    Ok(Output::Count(count))
}

/// Handle Min command.
pub fn min(reader: &dyn Reader, request: &AggregateRequest) -> Result<Output> {
    let aggregate = convert_result(reader.min(request))?;
    Ok(Output::Aggregate(aggregate))
}

/// Handle Max command.
pub fn max(reader: &dyn Reader, request: &AggregateRequest) -> Result<Output> {
    let aggregate = convert_result(reader.max(request))?;
    Ok(Output::Aggregate(aggregate))
}
