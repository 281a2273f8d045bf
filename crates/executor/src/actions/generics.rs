//! Generic create, update and delete actions over one collection.
//!
//! Each payload instance is a JSON object. Update and delete instances name
//! their target by `id`; they read it first and lock its `deleted` sentinel
//! at the position that read reported, so a concurrent delete turns the
//! write into a conflict.

use datastore_core::{
    Collection, EntityId, Fqid, Position, ReadOptions, WriteRequestBuilder, WriteRequestElement,
};
use serde_json::{Map, Value};

use super::Action;
use crate::{Datastore, Error, Result};

fn instance_object(instance: &Value) -> Result<&Map<String, Value>> {
    instance.as_object().ok_or_else(|| Error::InvalidPayload {
        reason: format!("payload instance must be an object, got {}", instance),
    })
}

fn instance_id(instance: &Map<String, Value>) -> Result<EntityId> {
    instance
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::InvalidPayload {
            reason: "payload instance needs a positive integer id".into(),
        })
}

/// Read every target once and pair it with the position its read reported.
fn read_targets(
    datastore: &dyn Datastore,
    collection: &Collection,
    payload: &[Value],
) -> Result<Vec<(Fqid, Position)>> {
    payload
        .iter()
        .map(|instance| {
            let fqid = collection.fqid(instance_id(instance_object(instance)?)?);
            let model = datastore.get(&fqid, Some(vec!["id".into()]), ReadOptions::default())?;
            Ok((fqid, model.meta_position))
        })
        .collect()
}

// =============================================================================
// Create
// =============================================================================

/// Create one entity per payload instance.
///
/// Ids are reserved up front; the instance fields are written as given plus
/// the reserved `id`. No fields are locked.
#[derive(Debug, Clone)]
pub struct CreateAction {
    name: String,
    collection: Collection,
}

impl CreateAction {
    /// Create the action
    pub fn new(name: impl Into<String>, collection: Collection) -> Self {
        CreateAction {
            name: name.into(),
            collection,
        }
    }
}

impl Action for CreateAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(
        &self,
        datastore: &dyn Datastore,
        payload: &[Value],
        user_id: u64,
    ) -> Result<Vec<WriteRequestElement>> {
        let instances = payload
            .iter()
            .map(instance_object)
            .collect::<Result<Vec<_>>>()?;
        if instances.is_empty() {
            return Ok(Vec::new());
        }

        let ids = datastore.reserve_ids(&self.collection, instances.len() as u64)?;
        if ids.len() != instances.len() {
            return Err(Error::Internal {
                reason: format!(
                    "reserved {} ids for {} instances",
                    ids.len(),
                    instances.len()
                ),
            });
        }

        Ok(instances
            .into_iter()
            .zip(ids)
            .map(|(instance, id)| {
                let fqid = self.collection.fqid(id);
                let mut fields = instance.clone();
                fields.insert("id".into(), Value::from(id));
                WriteRequestBuilder::new(user_id)
                    .create(fqid.clone(), fields)
                    .information(fqid, "Object created")
                    .build()
            })
            .collect())
    }
}

// =============================================================================
// Update
// =============================================================================

/// Update one existing entity per payload instance.
///
/// Every instance field except `id` is written; `null` clears a field.
#[derive(Debug, Clone)]
pub struct UpdateAction {
    name: String,
    collection: Collection,
}

impl UpdateAction {
    /// Create the action
    pub fn new(name: impl Into<String>, collection: Collection) -> Self {
        UpdateAction {
            name: name.into(),
            collection,
        }
    }
}

impl Action for UpdateAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(
        &self,
        datastore: &dyn Datastore,
        payload: &[Value],
        user_id: u64,
    ) -> Result<Vec<WriteRequestElement>> {
        let targets = read_targets(datastore, &self.collection, payload)?;
        payload
            .iter()
            .zip(targets)
            .map(|(instance, (fqid, position))| {
                let fields = instance_object(instance)?
                    .iter()
                    .filter(|(field, _)| field.as_str() != "id")
                    .map(|(field, value)| (field.clone(), value.clone()));
                Ok(WriteRequestBuilder::new(user_id)
                    .update(fqid.clone(), fields)
                    .information(fqid.clone(), "Object updated")
                    .lock_deleted(&fqid, position)
                    .build())
            })
            .collect()
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Delete one existing entity per payload instance.
#[derive(Debug, Clone)]
pub struct DeleteAction {
    name: String,
    collection: Collection,
}

impl DeleteAction {
    /// Create the action
    pub fn new(name: impl Into<String>, collection: Collection) -> Self {
        DeleteAction {
            name: name.into(),
            collection,
        }
    }
}

impl Action for DeleteAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn perform(
        &self,
        datastore: &dyn Datastore,
        payload: &[Value],
        user_id: u64,
    ) -> Result<Vec<WriteRequestElement>> {
        let targets = read_targets(datastore, &self.collection, payload)?;
        Ok(targets
            .into_iter()
            .map(|(fqid, position)| {
                WriteRequestBuilder::new(user_id)
                    .delete(fqid.clone())
                    .information(fqid.clone(), "Object deleted")
                    .lock_deleted(&fqid, position)
                    .build()
            })
            .collect())
    }
}
