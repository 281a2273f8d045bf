//! Action requests over the in-memory datastore.

use crate::common::*;
use datastore::{
    Action, ActionHandler, ActionRegistry, ActionRequest, CreateAction, Datastore, DeleteAction,
    Error, Filter, ReadOptions, Result, RetryConfig, UpdateAction, WriteRequestBuilder,
    WriteRequestElement,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

fn topic_registry() -> ActionRegistry {
    ActionRegistry::new()
        .with(CreateAction::new("topic.create", topic()))
        .and_then(|r| r.with(UpdateAction::new("topic.update", topic())))
        .and_then(|r| r.with(DeleteAction::new("topic.delete", topic())))
        .unwrap()
}

/// Renumbers the weights of every topic in a meeting, locking each weight
/// it read. On its first preparation it lets a rival writer slip in.
struct SortTopics {
    prepared: AtomicUsize,
}

impl Action for SortTopics {
    fn name(&self) -> &str {
        "topic.sort"
    }

    fn perform(
        &self,
        datastore: &dyn Datastore,
        payload: &[Value],
        user_id: u64,
    ) -> Result<Vec<WriteRequestElement>> {
        let mut elements = Vec::new();
        for instance in payload {
            let meeting_id = instance["meeting_id"].as_u64().unwrap_or_default();
            let topics = datastore.filter(
                &topic(),
                Filter::eq("meeting_id", meeting_id),
                Some(meeting_id),
                Some(vec!["id".into(), "weight".into()]),
            )?;

            if self.prepared.fetch_add(1, Ordering::SeqCst) == 0 {
                datastore.write(
                    WriteRequestBuilder::new(99)
                        .update(topic().fqid(1), [("weight".to_string(), json!(50))])
                        .build(),
                )?;
            }

            let mut builder = WriteRequestBuilder::new(user_id);
            for (rank, model) in topics.iter().enumerate() {
                let id = model.get_u64("id").unwrap_or_default();
                let fqid = topic().fqid(id);
                builder = builder
                    .update(fqid.clone(), [("weight".to_string(), json!(rank as u64 + 1))])
                    .lock(fqid.field("weight")?, model.meta_position);
            }
            elements.push(builder.build());
        }
        Ok(elements)
    }
}

#[test]
fn request_batch_from_json() {
    let (store, db) = memory_adapter();
    let registry = topic_registry();
    let requests: Vec<ActionRequest> = serde_json::from_value(json!([
        {"action": "topic.create", "data": [{"title": "A"}, {"title": "B"}]},
        {"action": "topic.create", "data": [{"title": "C"}]},
    ]))
    .unwrap();

    let results = ActionHandler::new(&registry, &db).handle(&requests, 1).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].fqids.len(), 2);
    assert_eq!(results[1].fqids.len(), 1);
    // Whole batch is one write
    assert_eq!(store.position().as_u64(), 1);
    assert_eq!(db.count(&topic(), Filter::ne("title", "X")).unwrap().count, 3);
}

#[test]
fn failing_request_writes_nothing() {
    let (store, db) = memory_adapter();
    let registry = topic_registry();

    let err = ActionHandler::new(&registry, &db)
        .handle(
            &[
                ActionRequest::new("topic.create", vec![json!({"title": "A"})]),
                ActionRequest::new("topic.update", vec![json!({"title": "no id"})]),
            ],
            1,
        )
        .unwrap_err();

    assert!(matches!(err, Error::InvalidPayload { .. }));
    assert_eq!(store.position().as_u64(), 0);
}

#[test]
fn update_then_delete_round() {
    let (_, db) = memory_adapter();
    let registry = topic_registry();
    let handler = ActionHandler::new(&registry, &db);

    let created = handler
        .handle(&[ActionRequest::new("topic.create", vec![json!({"title": "A"})])], 1)
        .unwrap();
    let fqid = created[0].fqids[0].clone();

    handler
        .handle(
            &[ActionRequest::new(
                "topic.update",
                vec![json!({"id": fqid.id, "title": "B"})],
            )],
            1,
        )
        .unwrap();
    let model = db.get(&fqid, None, ReadOptions::default()).unwrap();
    assert_eq!(model.get("title"), Some(&json!("B")));
    assert_eq!(model.get_u64("id"), Some(fqid.id));

    handler
        .handle(&[ActionRequest::new("topic.delete", vec![json!({"id": fqid.id})])], 1)
        .unwrap();
    assert!(db.get(&fqid, None, ReadOptions::default()).is_err());

    // Deleting again fails: the target no longer reads
    let err = handler
        .handle(&[ActionRequest::new("topic.delete", vec![json!({"id": fqid.id})])], 1)
        .unwrap_err();
    assert!(matches!(err, Error::Rejected { .. }));
}

#[test]
fn custom_action_retries_after_rival_write() {
    let (store, db) = memory_adapter();
    seed_topics(&db, 3, 1);
    let registry = ActionRegistry::new()
        .with(SortTopics {
            prepared: AtomicUsize::new(0),
        })
        .unwrap();

    ActionHandler::new(&registry, &db)
        .with_retry(RetryConfig::new().with_base_delay_ms(1))
        .handle(
            &[ActionRequest::new("topic.sort", vec![json!({"meeting_id": 1})])],
            1,
        )
        .unwrap();

    // seed (3) + rival (1) + sort (1)
    assert_eq!(store.position().as_u64(), 5);
    let weights: Vec<_> = db
        .filter(&topic(), Filter::eq("meeting_id", 1), Some(1), None)
        .unwrap()
        .iter()
        .map(|m| m.get_u64("weight"))
        .collect();
    assert_eq!(weights, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn custom_action_without_retry_surfaces_conflict() {
    let (store, db) = memory_adapter();
    seed_topics(&db, 3, 1);
    let registry = ActionRegistry::new()
        .with(SortTopics {
            prepared: AtomicUsize::new(0),
        })
        .unwrap();

    let err = ActionHandler::new(&registry, &db)
        .with_retry(RetryConfig::no_retry())
        .handle(
            &[ActionRequest::new("topic.sort", vec![json!({"meeting_id": 1})])],
            1,
        )
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(store.position().as_u64(), 4);
    let rival = db.get(&topic().fqid(1), None, ReadOptions::default()).unwrap();
    assert_eq!(rival.get_u64("weight"), Some(50));
}
