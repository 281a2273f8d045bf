//! # Datastore Executor
//!
//! The caller-facing API of the datastore client.
//!
//! It provides:
//! - [`Command`]/[`Output`] - the closed set of datastore operations and their results
//! - [`Executor`] - stateless dispatch of one command to one Reader/Writer call
//! - [`Datastore`]/[`Adapter`] - the typed façade actions read and write through
//! - [`actions`] - the action layer: registry, generic actions, request handler
//!
//! ## Quick Start
//!
//! ```text
//! use datastore_executor::{Adapter, Datastore};
//! use datastore_engine::DatastoreConfig;
//!
//! let adapter = Adapter::connect(&DatastoreConfig::from_env()?)?;
//! let topic = Collection::new("topic")?;
//! let count = adapter.count(&topic, Filter::eq("meeting_id", 5))?;
//! println!("{} topics at position {}", count.count, count.position);
//! ```
//!
//! ## Errors
//!
//! Every failure is an [`Error`]; [`Error::kind`] tells structural mistakes,
//! unavailability, rejections, conflicts and protocol errors apart.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actions;
mod adapter;
mod command;
mod convert;
mod error;
mod executor;
mod output;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API
// =============================================================================

pub use actions::{
    Action, ActionHandler, ActionRegistry, ActionRequest, ActionResult, CreateAction,
    DeleteAction, RetryConfig, UpdateAction,
};
pub use adapter::{Adapter, Datastore};
pub use command::Command;
pub use convert::convert_result;
pub use error::{Error, ErrorKind};
pub use executor::Executor;
pub use output::Output;

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
