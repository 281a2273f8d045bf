//! Datastore client - data-access core for an action-processing backend
//!
//! Translates domain-level read and write intents into requests against a
//! remote event-sourced datastore and enforces optimistic concurrency: every
//! write can assert that the fields it was prepared from have not changed
//! since they were read.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use datastore::{Adapter, Collection, Datastore, Filter, MemoryDatastore, WriteRequestBuilder};
//! use serde_json::json;
//!
//! let store = Arc::new(MemoryDatastore::new());
//! let db = Adapter::new(store.clone(), store);
//! let topic = Collection::new("topic").unwrap();
//!
//! let id = db.reserve_ids(&topic, 1).unwrap()[0];
//! db.write(
//!     WriteRequestBuilder::new(1)
//!         .create(topic.fqid(id), [("title".to_string(), json!("Agenda"))])
//!         .build(),
//! )
//! .unwrap();
//!
//! let found = db.exists(&topic, Filter::eq("title", "Agenda")).unwrap();
//! assert!(found.exists);
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`], which dispatches one
//! [`Command`] to one Reader/Writer call. The [`Adapter`] is the typed
//! façade over it; the [`actions`] module builds on the adapter.
//!
//! The lower layers stay reachable as [`core`], [`concurrency`] and
//! [`engine`].

// Re-export the public API from datastore-executor
pub use datastore_executor::*;

pub use datastore_concurrency as concurrency;
pub use datastore_core as core;
pub use datastore_engine as engine;

pub use datastore_core::{
    Aggregate, AggregateType, Collection, CollectionRequest, Count, DeletedModelsBehaviour,
    EntityId, Event, Filter, FilterOperator, FqField, Fqid, Found, ModelMap, PartialModel,
    Position, ReadOptions, WriteRequestBuilder, WriteRequestElement,
};
pub use datastore_engine::{DatastoreConfig, HttpReader, HttpWriter, MemoryDatastore, Reader, Writer};
