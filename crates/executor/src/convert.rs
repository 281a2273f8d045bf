//! Error conversion from internal error types.
//!
//! This module provides conversions from the core datastore error to
//! the executor's [`Error`] type.

use crate::Error;
use datastore_core::Error as CoreError;

/// Convert a core error to an executor Error.
///
/// This preserves all error details while mapping to the matching
/// executor error variant.
impl From<CoreError> for Error {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidFilter(reason) => Error::InvalidFilter { reason },
            CoreError::InvalidAddress(reason) => Error::InvalidAddress { reason },
            CoreError::InvalidWriteRequest(reason) => Error::InvalidWriteRequest { reason },
            CoreError::Unavailable(reason) => Error::Unavailable { reason },
            CoreError::Rejected { status, message } => Error::Rejected { status, message },
            CoreError::Conflict { fqfields, message } => Error::Conflict { fqfields, message },
            CoreError::Serialization(reason) => Error::Serialization { reason },
            CoreError::Config(reason) => Error::InvalidConfig { reason },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Convert a core Result to an executor Result
pub fn convert_result<T>(result: datastore_core::Result<T>) -> crate::Result<T> {
    result.map_err(Error::from)
}
