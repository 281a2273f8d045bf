//! HTTP implementation of [`Writer`]

use datastore_core::{EntityId, Error, ReserveIdsRequest, Result, WriteRequest};
use serde_json::Value;
use std::time::Duration;

use super::client::HttpClient;
use crate::config::DatastoreConfig;
use crate::traits::Writer;

/// Writer talking to the datastore's writer service
#[derive(Debug, Clone)]
pub struct HttpWriter {
    client: HttpClient,
}

impl HttpWriter {
    /// Create a writer for the service at `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        HttpWriter {
            client: HttpClient::new(url, timeout),
        }
    }

    /// Create a writer from connection settings
    pub fn from_config(config: &DatastoreConfig) -> Self {
        Self::new(config.write_url.clone(), config.timeout())
    }

    /// The underlying client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

impl Writer for HttpWriter {
    fn write(&self, request: &WriteRequest) -> Result<()> {
        self.client.post("write", &request.data())?;
        Ok(())
    }

    fn reserve_ids(&self, request: &ReserveIdsRequest) -> Result<Vec<EntityId>> {
        let value = self.client.post("reserve_ids", &request.data())?;
        decode_reserved_ids(value, request.number)
    }
}

/// Decode a `reserve_ids` response
///
/// Accepts a bare array or `{"ids": [...]}` and checks that exactly the
/// requested number of ids came back.
pub fn decode_reserved_ids(value: Value, number: u64) -> Result<Vec<EntityId>> {
    let ids = match value {
        Value::Object(mut map) => map.remove("ids").unwrap_or(Value::Null),
        other => other,
    };
    let ids: Vec<EntityId> = serde_json::from_value(ids)?;
    if ids.len() as u64 != number {
        return Err(Error::Serialization(format!(
            "requested {} ids, datastore returned {}",
            number,
            ids.len()
        )));
    }
    Ok(ids)
}
