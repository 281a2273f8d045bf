//! HTTP transport to a remote datastore
//!
//! The remote datastore exposes two services:
//! - reader: `get`, `get_many`, `get_all`, `filter`, `exists`, `count`, `min`, `max`
//! - writer: `write`, `reserve_ids`
//!
//! Each call POSTs the request's `data()` payload as JSON to
//! `<base_url>/<endpoint>`.

mod client;
mod reader;
mod writer;

pub use client::{classify_response, HttpClient, MODEL_LOCKED, UNAVAILABLE_MESSAGE};
pub use reader::{decode_aggregate, decode_model_list, decode_model_map, HttpReader};
pub use writer::{decode_reserved_ids, HttpWriter};

use crate::config::DatastoreConfig;

/// Create the reader / writer pair for a configuration
///
/// # Errors
///
/// Returns `Error::Config` if the configuration is invalid.
pub fn connect(config: &DatastoreConfig) -> datastore_core::Result<(HttpReader, HttpWriter)> {
    config.validate()?;
    tracing::info!(
        target: "datastore::http",
        read_url = %config.read_url,
        write_url = %config.write_url,
        timeout_ms = config.timeout_ms,
        "Datastore transport configured"
    );
    Ok((HttpReader::from_config(config), HttpWriter::from_config(config)))
}
