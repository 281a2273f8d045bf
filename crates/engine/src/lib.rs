//! Datastore engines
//!
//! This crate provides the boundary between the datastore client and the
//! datastore itself:
//! - Reader / Writer: capability traits, one method per protocol operation
//! - http: transport to a remote datastore (reader and writer services)
//! - memory: in-process datastore with the remote side's semantics
//! - config: connection settings from `datastore.toml` or the environment

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod http;
pub mod memory;
pub mod traits;

pub use config::DatastoreConfig;
pub use http::{classify_response, connect, HttpReader, HttpWriter};
pub use memory::MemoryDatastore;
pub use traits::{Reader, Writer};
