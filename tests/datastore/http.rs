//! HTTP transport against a local one-shot server.

use crate::common::*;
use datastore::{
    Adapter, Datastore, DatastoreConfig, Error, ErrorKind, Filter, HttpReader, HttpWriter,
    Position, ReadOptions, WriteRequestBuilder,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Adapter whose reader and writer both talk to `url`
fn http_adapter(url: &str) -> Adapter {
    init_tracing();
    Adapter::new(
        Arc::new(HttpReader::new(url, TIMEOUT)),
        Arc::new(HttpWriter::new(url, TIMEOUT)),
    )
}

#[test]
fn get_posts_payload_and_decodes_model() {
    let (url, seen, server) = one_shot_server(
        200,
        r#"{"title": "Agenda", "meta_deleted": false, "meta_position": 3}"#,
    );
    let db = http_adapter(&url);

    let model = db
        .get(&topic().fqid(42), Some(vec!["title".into()]), ReadOptions::default())
        .unwrap();
    server.join().unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/get");
    assert_eq!(
        request.body,
        json!({"fqid": "topic/42", "mapped_fields": ["title"]})
    );
    assert_eq!(model.get("title"), Some(&json!("Agenda")));
    assert_eq!(model.meta_position, Position::new(3));
}

#[test]
fn get_many_by_fqids_uses_get_many_endpoint() {
    let (url, seen, server) = one_shot_server(
        200,
        r#"{"topic/1": {"meta_deleted": false, "meta_position": 1}}"#,
    );
    let db = http_adapter(&url);

    let map = db.get_many_by_fqids(vec![topic().fqid(1)]).unwrap();
    server.join().unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.path, "/get_many");
    assert_eq!(request.body, json!({"requests": ["topic/1"]}));
    assert!(map[&topic()].contains_key(&1));
}

#[test]
fn count_sends_filter_encoding() {
    let (url, seen, server) = one_shot_server(200, r#"{"count": 2, "position": 5}"#);
    let db = http_adapter(&url);

    let count = db.count(&topic(), Filter::eq("meeting_id", 5)).unwrap();
    server.join().unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.path, "/count");
    assert_eq!(
        request.body,
        json!({
            "collection": "topic",
            "filter": {"field": "meeting_id", "value": 5, "operator": "="},
        })
    );
    assert_eq!(count.count, 2);
    assert_eq!(count.position, Position::new(5));
}

#[test]
fn filter_payload_omits_projection_and_reader_applies_it() {
    let (url, seen, server) = one_shot_server(
        200,
        r#"[{"title": "A", "text": "long", "meta_deleted": false, "meta_position": 2}]"#,
    );
    let db = http_adapter(&url);

    let models = db
        .filter(&topic(), Filter::eq("meeting_id", 5), Some(5), Some(vec!["title".into()]))
        .unwrap();
    server.join().unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.path, "/filter");
    assert_eq!(
        request.body,
        json!({
            "collection": "topic",
            "filter": {"field": "meeting_id", "value": 5, "operator": "="},
        })
    );
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].get("title"), Some(&json!("A")));
    assert!(models[0].get("text").is_none());
}

#[test]
fn write_sends_element_payload() {
    let (url, seen, server) = one_shot_server(200, "");
    let db = http_adapter(&url);

    db.write(
        WriteRequestBuilder::new(7)
            .update(topic().fqid(1), [("title".to_string(), json!("New"))])
            .information(topic().fqid(1), "Object updated")
            .lock_deleted(&topic().fqid(1), Position::new(4))
            .build(),
    )
    .unwrap();
    server.join().unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.path, "/write");
    assert_eq!(
        request.body,
        json!({
            "events": [{"type": "update", "fqid": "topic/1", "fields": {"title": "New"}}],
            "information": {"topic/1": ["Object updated"]},
            "user_id": 7,
            "locked_fields": {"topic/1/deleted": 4},
        })
    );
}

#[test]
fn reserve_ids_accepts_wrapped_list() {
    let (url, seen, server) = one_shot_server(200, r#"{"ids": [4, 5, 6]}"#);
    let db = http_adapter(&url);

    let ids = db.reserve_ids(&topic(), 3).unwrap();
    server.join().unwrap();

    let request = seen.recv().unwrap();
    assert_eq!(request.path, "/reserve_ids");
    assert_eq!(request.body, json!({"collection": "topic", "number": 3}));
    assert_eq!(ids, vec![4, 5, 6]);
}

#[test]
fn server_error_is_unavailable() {
    let (url, _seen, server) = one_shot_server(503, "");
    let db = http_adapter(&url);

    let err = db.exists(&topic(), Filter::eq("id", 1)).unwrap_err();
    server.join().unwrap();

    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(err.is_retryable());
}

#[test]
fn error_message_is_rejected_verbatim() {
    let (url, _seen, server) =
        one_shot_server(400, r#"{"error": "Collection foo does not exist"}"#);
    let db = http_adapter(&url);

    let err = db.get_all(&topic(), None, None).unwrap_err();
    server.join().unwrap();

    match err {
        Error::Rejected { status, message } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "Collection foo does not exist");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[test]
fn model_locked_is_conflict() {
    let (url, _seen, server) = one_shot_server(
        400,
        r#"{"error": {"type_verbose": "MODEL_LOCKED", "key": "topic/42/deleted", "msg": "Model topic/42 is locked"}}"#,
    );
    let db = http_adapter(&url);

    let err = db
        .write(
            WriteRequestBuilder::new(1)
                .delete(topic().fqid(42))
                .lock_deleted(&topic().fqid(42), Position::new(7))
                .build(),
        )
        .unwrap_err();
    server.join().unwrap();

    assert!(err.is_conflict());
    match err {
        Error::Conflict { fqfields, message } => {
            assert_eq!(fqfields, vec![topic().fqid(42).deleted_field()]);
            assert_eq!(message, "Model topic/42 is locked");
        }
        other => panic!("expected Conflict, got {:?}", other),
    }
}

#[test]
fn refused_connection_is_unavailable() {
    // Bind then drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let db = http_adapter(&format!("http://127.0.0.1:{}/", port));

    let err = db.reserve_ids(&topic(), 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}

#[test]
fn connect_from_config_targets_both_services() {
    let config = DatastoreConfig::from_lookup(|key| match key {
        "DATASTORE_READ_URL" => Some("http://reader.local:9002/".to_string()),
        "DATASTORE_WRITE_URL" => Some("http://writer.local:9003/".to_string()),
        _ => None,
    })
    .unwrap();

    let reader = HttpReader::from_config(&config);
    let writer = HttpWriter::from_config(&config);
    assert_eq!(reader.client().endpoint_url("get"), "http://reader.local:9002/get");
    assert_eq!(
        writer.client().endpoint_url("write"),
        "http://writer.local:9003/write"
    );
    assert!(Adapter::connect(&config).is_ok());
}
