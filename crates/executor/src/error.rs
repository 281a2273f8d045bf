//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Lossless**: No error information is lost in conversion from internal errors

use datastore_core::FqField;
use serde::{Deserialize, Serialize};

/// Coarse classification of an [`Error`].
///
/// Callers that only need to decide "fix the request", "try again later",
/// "re-read and retry" or "report a bug" can match on the kind instead of
/// the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request was malformed before it left the process
    Structural,
    /// The datastore could not be reached or failed internally
    Unavailable,
    /// The datastore refused the request
    Rejected,
    /// A locked field moved; retry from a fresh read
    Conflict,
    /// Unexpected payload or output shape
    Protocol,
}

/// Command execution errors.
///
/// All errors that can occur during command execution are represented here.
/// Errors are structured to preserve details for client-side handling.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Structural | `InvalidFilter`, `InvalidAddress`, `InvalidWriteRequest`, `InvalidPayload`, `InvalidConfig` | Bad input |
/// | Action | `UnknownAction`, `DuplicateAction` | Action registry misuse |
/// | Remote | `Unavailable`, `Rejected` | Datastore refused or failed |
/// | Concurrency | `Conflict` | Locked field moved |
/// | System | `Serialization`, `Internal` | Protocol errors |
///
/// # Example
///
/// ```ignore
/// use datastore_executor::{Command, Error, Executor};
///
/// match executor.execute(cmd) {
///     Ok(output) => { /* handle success */ }
///     Err(Error::Conflict { fqfields, .. }) => {
///         println!("re-read {} field(s) and retry", fqfields.len());
///     }
///     Err(e) => {
///         println!("Error: {}", e);
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Structural ====================
    /// Malformed filter tree
    #[error("invalid filter: {reason}")]
    InvalidFilter { reason: String },

    /// Malformed collection name, FQID or FQField
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },

    /// Write request element cannot be assembled or merged
    #[error("invalid write request: {reason}")]
    InvalidWriteRequest { reason: String },

    /// Action payload does not have the expected shape
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },

    /// Connection settings are invalid
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ==================== Action ====================
    /// No action registered under this name
    #[error("Action {action} does not exist.")]
    UnknownAction { action: String },

    /// An action with this name is already registered
    #[error("action already registered: {action}")]
    DuplicateAction { action: String },

    // ==================== Remote ====================
    /// Datastore could not be reached or answered with a server error
    #[error("datastore unavailable: {reason}")]
    Unavailable { reason: String },

    /// Datastore refused the request
    #[error("datastore rejected request: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    // ==================== Concurrency ====================
    /// One or more locked fields changed after the asserted position
    #[error("conflict: {message}")]
    Conflict {
        fqfields: Vec<FqField>,
        message: String,
    },

    // ==================== System ====================
    /// Malformed payload in either direction
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Executor produced an output the caller did not expect
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFilter { .. }
            | Error::InvalidAddress { .. }
            | Error::InvalidWriteRequest { .. }
            | Error::InvalidPayload { .. }
            | Error::InvalidConfig { .. }
            | Error::UnknownAction { .. }
            | Error::DuplicateAction { .. } => ErrorKind::Structural,
            Error::Unavailable { .. } => ErrorKind::Unavailable,
            Error::Rejected { .. } => ErrorKind::Rejected,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Serialization { .. } | Error::Internal { .. } => ErrorKind::Protocol,
        }
    }

    /// Check if this error is a concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Whether repeating the operation may succeed
    ///
    /// Conflicts are only worth retrying after re-reading the data the write
    /// was prepared from.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unavailable | ErrorKind::Conflict)
    }
}
