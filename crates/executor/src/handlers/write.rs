//! Write command handlers.

use datastore_core::{ReserveIdsRequest, WriteRequest};
use datastore_engine::Writer;

use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle Write command.
pub fn write(writer: &dyn Writer, request: &WriteRequest) -> Result<Output> {
    convert_result(writer.write(request))?;
    Ok(Output::Unit)
}

/// Handle ReserveIds command.
pub fn reserve_ids(writer: &dyn Writer, request: &ReserveIdsRequest) -> Result<Output> {
    let ids = convert_result(writer.reserve_ids(request))?;
    Ok(Output::Ids(ids))
}
