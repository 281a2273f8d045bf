//! Optimistic locking with real threads through the public API.

use crate::common::*;
use datastore::{
    ActionHandler, ActionRegistry, ActionRequest, Adapter, Datastore, Error, Position,
    ReadOptions, RetryConfig, UpdateAction, WriteRequestBuilder,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

/// Test: Read-then-lock writers racing on one field; exactly one wins and
/// the loser changed nothing.
#[test]
fn racing_writers_one_commits() {
    let (store, db) = memory_adapter();
    create(&db, topic().fqid(1), json!({"title": "start", "text": "start"}));
    let observed = db
        .get(&topic().fqid(1), None, ReadOptions::default())
        .unwrap()
        .meta_position;

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let fqid = topic().fqid(1);
                db.write(
                    WriteRequestBuilder::new(1)
                        .update(
                            fqid.clone(),
                            [
                                ("title".to_string(), json!(format!("writer {}", i))),
                                ("text".to_string(), json!(format!("writer {}", i))),
                            ],
                        )
                        .lock(fqid.field("title").unwrap(), observed)
                        .build(),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(Error::is_conflict));

    let model = db.get(&topic().fqid(1), None, ReadOptions::default()).unwrap();
    assert_eq!(model.get("title"), model.get("text"), "no partial application");
    assert_eq!(store.position(), observed.next());
}

/// Test: Concurrent id reservation from many threads never hands out an id twice
#[test]
fn concurrent_reserve_ids_disjoint() {
    let (_, db) = memory_adapter();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..20)
                    .flat_map(|_| db.reserve_ids(&topic(), 3).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for h in handles {
        for id in h.join().unwrap() {
            assert!(seen.insert(id), "id {} handed out twice", id);
        }
    }
    assert_eq!(seen.len(), threads * 20 * 3);
}

/// Test: Action requests updating the same topic concurrently all succeed
/// through conflict retries, one write each.
#[test]
fn concurrent_actions_converge_with_retries() {
    let (store, db) = memory_adapter();
    create(&db, topic().fqid(1), json!({"title": "start"}));
    let start = store.position();

    let registry = Arc::new(
        ActionRegistry::new()
            .with(UpdateAction::new("topic.update", topic()))
            .unwrap(),
    );
    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let db: Adapter = db.clone();
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let handler = ActionHandler::new(&registry, &db).with_retry(
                    RetryConfig::new()
                        .with_max_retries(20)
                        .with_base_delay_ms(1)
                        .with_max_delay_ms(5),
                );
                barrier.wait();
                handler.handle(
                    &[ActionRequest::new(
                        "topic.update",
                        vec![json!({"id": 1, "title": format!("writer {}", i)})],
                    )],
                    1,
                )
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap().unwrap();
    }
    assert_eq!(
        store.position(),
        Position::new(start.as_u64() + threads as u64)
    );
}
