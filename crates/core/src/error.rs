//! Error types for the datastore core
//!
//! This module defines the structured errors shared by every layer below the
//! executor. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! The variants follow the failure taxonomy of the datastore protocol:
//!
//! | Variant | Origin | Retryable |
//! |---------|--------|-----------|
//! | `InvalidFilter` | local, filter construction | no |
//! | `InvalidAddress` | local, collection / FQID / FQField parsing | no |
//! | `InvalidWriteRequest` | local, write element assembly | no |
//! | `Unavailable` | remote >= 500 or connection failure | yes |
//! | `Rejected` | remote validation failure | no |
//! | `Conflict` | a locked field moved past its asserted position | yes, from a fresh read |
//! | `Serialization` | malformed payload in either direction | no |
//! | `Config` | invalid connection configuration | no |

use crate::types::FqField;
use thiserror::Error;

/// Result type alias for datastore core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the datastore core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Structurally malformed filter tree (e.g. an empty `and_filter`)
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Malformed collection name, FQID or FQField
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Write request element cannot be assembled
    #[error("invalid write request: {0}")]
    InvalidWriteRequest(String),

    /// Datastore could not be reached or answered with a server error
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    /// Datastore refused the request
    #[error("datastore rejected request: {message}")]
    Rejected {
        /// HTTP status, when the rejection came over the wire
        status: Option<u16>,
        /// Server-supplied message, verbatim
        message: String,
    },

    /// One or more locked fields changed after the asserted position
    #[error("concurrency conflict on {}: {message}", display_fqfields(.fqfields))]
    Conflict {
        /// The locked fields that no longer hold
        fqfields: Vec<FqField>,
        /// Server-supplied or locally generated description
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is invalid
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a rejection without transport status
    pub fn rejected(message: impl Into<String>) -> Self {
        Error::Rejected {
            status: None,
            message: message.into(),
        }
    }

    /// Check if this error is a concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

fn display_fqfields(fqfields: &[FqField]) -> String {
    if fqfields.is_empty() {
        return "<unknown field>".to_string();
    }
    fqfields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
