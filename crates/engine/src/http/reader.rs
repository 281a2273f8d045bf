//! HTTP implementation of [`Reader`]

use datastore_core::{
    Aggregate, AggregateRequest, Collection, Count, EntityId, Error, FilterRequest, Found, Fqid,
    GetAllRequest, GetManyByFqidsRequest, GetManyRequest, GetRequest, ModelMap, PartialModel,
    Position, Result,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::client::HttpClient;
use crate::config::DatastoreConfig;
use crate::traits::Reader;

/// Reader talking to the datastore's reader service
#[derive(Debug, Clone)]
pub struct HttpReader {
    client: HttpClient,
}

impl HttpReader {
    /// Create a reader for the service at `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        HttpReader {
            client: HttpClient::new(url, timeout),
        }
    }

    /// Create a reader from connection settings
    pub fn from_config(config: &DatastoreConfig) -> Self {
        Self::new(config.read_url.clone(), config.timeout())
    }

    /// The underlying client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}

impl Reader for HttpReader {
    fn get(&self, request: &GetRequest) -> Result<PartialModel> {
        let value = self.client.post("get", &request.data())?;
        Ok(serde_json::from_value(value)?)
    }

    fn get_many(&self, request: &GetManyRequest) -> Result<ModelMap> {
        decode_model_map(self.client.post("get_many", &request.data())?)
    }

    fn get_many_by_fqids(&self, request: &GetManyByFqidsRequest) -> Result<ModelMap> {
        decode_model_map(self.client.post("get_many", &request.data())?)
    }

    fn get_all(&self, request: &GetAllRequest) -> Result<Vec<PartialModel>> {
        decode_model_list(self.client.post("get_all", &request.data())?)
    }

    fn filter(&self, request: &FilterRequest) -> Result<Vec<PartialModel>> {
        let models = decode_model_list(self.client.post("filter", &request.data())?)?;
        Ok(match &request.mapped_fields {
            Some(fields) => models.into_iter().map(|m| m.project(fields)).collect(),
            None => models,
        })
    }

    fn exists(&self, request: &FilterRequest) -> Result<Found> {
        Ok(serde_json::from_value(
            self.client.post("exists", &request.data())?,
        )?)
    }

    fn count(&self, request: &FilterRequest) -> Result<Count> {
        Ok(serde_json::from_value(
            self.client.post("count", &request.data())?,
        )?)
    }

    fn min(&self, request: &AggregateRequest) -> Result<Aggregate> {
        decode_aggregate(self.client.post("min", &request.data())?, "min")
    }

    fn max(&self, request: &AggregateRequest) -> Result<Aggregate> {
        decode_aggregate(self.client.post("max", &request.data())?, "max")
    }
}

// ============================================================================
// Response Decoding
// ============================================================================

/// Decode a batched read response
///
/// Accepts both the nested `{collection: {id: model}}` shape and the flat
/// `{"collection/id": model}` shape.
pub fn decode_model_map(value: Value) -> Result<ModelMap> {
    let Value::Object(entries) = value else {
        return Err(Error::Serialization(format!(
            "expected an object from get_many, got {}",
            value
        )));
    };

    let mut map = ModelMap::new();
    for (key, inner) in entries {
        if key.contains(datastore_core::KEYSEPARATOR) {
            let fqid: Fqid = key.parse()?;
            let model: PartialModel = serde_json::from_value(inner)?;
            map.entry(fqid.collection).or_default().insert(fqid.id, model);
        } else {
            let collection = Collection::new(key)?;
            let models: BTreeMap<EntityId, PartialModel> = serde_json::from_value(inner)?;
            map.entry(collection).or_default().extend(models);
        }
    }
    Ok(map)
}

/// Decode a list-of-models response
///
/// Accepts a JSON array, an `{id: model}` object (ordered by id), or either
/// of those wrapped in `{"data": ...}`.
pub fn decode_model_list(value: Value) -> Result<Vec<PartialModel>> {
    let value = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(_) => {
            let by_id: BTreeMap<EntityId, PartialModel> = serde_json::from_value(value)?;
            Ok(by_id.into_values().collect())
        }
        other => Err(Error::Serialization(format!(
            "expected a list of models, got {}",
            other
        ))),
    }
}

/// Decode a `min` / `max` response
///
/// The aggregated value is read from `key` (`"min"` or `"max"`), falling
/// back to `"value"`. A `null` value means nothing matched.
pub fn decode_aggregate(value: Value, key: &str) -> Result<Aggregate> {
    let position = value
        .get("position")
        .and_then(Value::as_u64)
        .map(Position::new)
        .ok_or_else(|| {
            Error::Serialization(format!("{} response lacks a position: {}", key, value))
        })?;
    let aggregated = value
        .get(key)
        .or_else(|| value.get("value"))
        .filter(|v| !v.is_null())
        .cloned();
    Ok(Aggregate {
        value: aggregated,
        position,
    })
}
