//! Documented datastore scenarios, end to end over the in-memory datastore.

use crate::common::*;
use datastore::{
    AggregateType, Collection, CollectionRequest, Datastore, DeletedModelsBehaviour, Error,
    ErrorKind, Filter, Position, ReadOptions, WriteRequestBuilder,
};
use serde_json::json;
use std::collections::HashSet;

// ============================================================================
// Scenario A: projected single-entity read
// ============================================================================

#[test]
fn scenario_a_get_with_mapped_fields() {
    let (store, db) = memory_adapter();
    create(&db, topic().fqid(42), json!({"title": "Agenda", "text": "long"}));

    let model = db
        .get(&topic().fqid(42), Some(vec!["title".into()]), ReadOptions::default())
        .unwrap();

    assert_eq!(
        serde_json::to_value(&model).unwrap(),
        json!({"title": "Agenda", "meta_deleted": false, "meta_position": store.position().as_u64()})
    );
}

#[test]
fn get_is_idempotent_on_unchanged_state() {
    let (_, db) = memory_adapter();
    seed_topics(&db, 3, 1);
    let first = db.get(&topic().fqid(2), None, ReadOptions::default()).unwrap();
    let second = db.get(&topic().fqid(2), None, ReadOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn get_at_earlier_position_sees_history() {
    let (_, db) = memory_adapter();
    create(&db, topic().fqid(1), json!({"title": "v1"}));
    db.write(
        WriteRequestBuilder::new(1)
            .update(topic().fqid(1), [("title".to_string(), json!("v2"))])
            .build(),
    )
    .unwrap();

    let old = db
        .get(&topic().fqid(1), None, ReadOptions::at(Position::new(1)))
        .unwrap();
    let new = db.get(&topic().fqid(1), None, ReadOptions::default()).unwrap();
    assert_eq!(old.get("title"), Some(&json!("v1")));
    assert_eq!(new.get("title"), Some(&json!("v2")));
    assert_eq!(new.meta_position, Position::new(2));
}

#[test]
fn deleted_models_only_visible_on_request() {
    let (_, db) = memory_adapter();
    seed_topics(&db, 2, 1);
    db.write(WriteRequestBuilder::new(1).delete(topic().fqid(1)).build())
        .unwrap();

    let missing = db
        .get(&topic().fqid(1), None, ReadOptions::default())
        .unwrap_err();
    assert!(matches!(missing, Error::Rejected { .. }));

    let deleted = db
        .get(
            &topic().fqid(1),
            None,
            ReadOptions::default().with_deleted(DeletedModelsBehaviour::OnlyDeleted),
        )
        .unwrap();
    assert!(deleted.meta_deleted);

    let all = db
        .get_all(&topic(), None, Some(DeletedModelsBehaviour::AllModels))
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(db.get_all(&topic(), None, None).unwrap().len(), 1);
}

#[test]
fn get_many_groups_by_collection() {
    let (_, db) = memory_adapter();
    seed_topics(&db, 3, 1);
    let motion = Collection::new("motion").unwrap();
    create(&db, motion.fqid(9), json!({"title": "Motion"}));

    let result = db
        .get_many(
            vec![
                CollectionRequest::new(topic(), vec![1, 3], None),
                CollectionRequest::new(motion.clone(), vec![9], Some(vec!["title".into()])),
            ],
            Some(vec!["weight".into()]),
            ReadOptions::default(),
        )
        .unwrap();

    assert_eq!(result[&topic()].len(), 2);
    assert_eq!(result[&topic()][&3].get_u64("weight"), Some(3));
    assert!(result[&topic()][&3].get("title").is_none());
    assert_eq!(result[&motion][&9].get("title"), Some(&json!("Motion")));

    let by_fqid = db.get_many_by_fqids(vec![topic().fqid(2)]).unwrap();
    assert_eq!(by_fqid[&topic()].keys().copied().collect::<Vec<_>>(), vec![2]);
}

// ============================================================================
// Scenario B: filter encoding and evaluation
// ============================================================================

#[test]
fn scenario_b_and_filter_encoding() {
    let filter = Filter::and(vec![
        Filter::eq("meeting_id", 5),
        Filter::eq("title", "Foo"),
    ])
    .unwrap();

    assert_eq!(
        filter.to_value(),
        json!({"and_filter": [
            {"field": "meeting_id", "value": 5, "operator": "="},
            {"field": "title", "value": "Foo", "operator": "="},
        ]})
    );
}

#[test]
fn filter_exists_count_min_max() {
    let (store, db) = memory_adapter();
    seed_topics(&db, 5, 1);
    create(&db, topic().fqid(6), json!({"meeting_id": 2, "weight": 100}));
    let position = store.position();

    let heavy = db
        .filter(&topic(), Filter::ge("weight", 4), Some(1), Some(vec!["weight".into()]))
        .unwrap();
    assert_eq!(heavy.len(), 3);

    let found = db.exists(&topic(), Filter::eq("meeting_id", 2)).unwrap();
    assert!(found.exists);
    assert_eq!(found.position, position);

    let none = db.exists(&topic(), Filter::eq("meeting_id", 3)).unwrap();
    assert!(!none.exists);

    let count = db
        .count(
            &topic(),
            Filter::and(vec![Filter::eq("meeting_id", 1), Filter::not(Filter::eq("weight", 2))])
                .unwrap(),
        )
        .unwrap();
    assert_eq!(count.count, 4);

    let min = db
        .min(&topic(), Filter::eq("meeting_id", 1), "weight", Some(AggregateType::Int))
        .unwrap();
    let max = db.max(&topic(), Filter::eq("meeting_id", 1), "weight", None).unwrap();
    assert_eq!(min.value, Some(json!(1)));
    assert_eq!(max.value, Some(json!(5)));
    assert_eq!(max.position, position);

    let empty = db.max(&topic(), Filter::eq("meeting_id", 9), "weight", None).unwrap();
    assert_eq!(empty.value, None);
}

// ============================================================================
// Scenario C: stale lock is rejected without partial application
// ============================================================================

#[test]
fn scenario_c_stale_lock_conflicts_and_leaves_title() {
    let (store, db) = memory_adapter();
    // Positions 1..=6: unrelated topics
    seed_topics(&db, 6, 1);
    // 7: create topic/42, 8: delete it, 9: create it again
    create(&db, topic().fqid(42), json!({"title": "first"}));
    db.write(WriteRequestBuilder::new(1).delete(topic().fqid(42)).build())
        .unwrap();
    create(&db, topic().fqid(42), json!({"title": "Original"}));
    let deleted = topic().fqid(42).deleted_field();
    assert_eq!(store.field_position(&deleted), Position::new(9));

    let element = WriteRequestBuilder::new(1)
        .update(topic().fqid(42), [("title".to_string(), json!("Changed"))])
        .update(topic().fqid(1), [("title".to_string(), json!("Changed too"))])
        .lock(deleted.clone(), Position::new(7))
        .build();
    let err = db.write(element).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.is_retryable());

    match err {
        Error::Conflict { fqfields, .. } => assert_eq!(fqfields, vec![deleted]),
        other => panic!("expected Conflict, got {:?}", other),
    }
    let title = db.get(&topic().fqid(42), None, ReadOptions::default()).unwrap();
    assert_eq!(title.get("title"), Some(&json!("Original")));
    let other = db.get(&topic().fqid(1), None, ReadOptions::default()).unwrap();
    assert_eq!(other.get("title"), Some(&json!("Topic 1")));
    assert_eq!(store.position(), Position::new(9));
}

#[test]
fn current_lock_applies_atomically() {
    let (store, db) = memory_adapter();
    seed_topics(&db, 2, 1);
    let observed = db
        .get(&topic().fqid(2), None, ReadOptions::default())
        .unwrap()
        .meta_position;

    db.write(
        WriteRequestBuilder::new(1)
            .update(topic().fqid(2), [("title".to_string(), json!("Renamed"))])
            .delete(topic().fqid(1))
            .lock_deleted(&topic().fqid(2), observed)
            .build(),
    )
    .unwrap();

    assert_eq!(store.position(), Position::new(3));
    let renamed = db.get(&topic().fqid(2), None, ReadOptions::default()).unwrap();
    assert_eq!(renamed.get("title"), Some(&json!("Renamed")));
    assert!(db.get(&topic().fqid(1), None, ReadOptions::default()).is_err());
}

// ============================================================================
// Scenario D: id reservation
// ============================================================================

#[test]
fn scenario_d_reserve_ids_disjoint() {
    let (_, db) = memory_adapter();
    let first = db.reserve_ids(&topic(), 3).unwrap();
    let second = db.reserve_ids(&topic(), 3).unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    let all: HashSet<_> = first.iter().chain(second.iter()).collect();
    assert_eq!(all.len(), 6);
    assert!(first.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn reserved_ids_skip_written_ids() {
    let (_, db) = memory_adapter();
    create(&db, topic().fqid(10), json!({"title": "manual"}));
    let ids = db.reserve_ids(&topic(), 2).unwrap();
    assert_eq!(ids, vec![11, 12]);
}
