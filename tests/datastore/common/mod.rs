//! Shared test utilities for the datastore integration suite.

#![allow(dead_code)]

use std::sync::mpsc;
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};

use axum::body::Bytes;
use axum::http::{header, Method, StatusCode, Uri};
use axum::Router;
use tokio::sync::Notify;

use datastore::{Adapter, Collection, Datastore, EntityId, Fqid, MemoryDatastore, WriteRequestBuilder};
use serde_json::{json, Value};

static INIT_TRACING: Once = Once::new();

/// Install a debug-level test subscriber once
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn topic() -> Collection {
    Collection::new("topic").unwrap()
}

/// In-memory datastore plus an adapter over it
pub fn memory_adapter() -> (Arc<MemoryDatastore>, Adapter) {
    init_tracing();
    let store = Arc::new(MemoryDatastore::new());
    let adapter = Adapter::new(store.clone(), store.clone());
    (store, adapter)
}

/// Create `collection/id` with the given fields in one write
pub fn create(db: &dyn Datastore, fqid: Fqid, fields: Value) {
    let fields = fields
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter();
    db.write(WriteRequestBuilder::new(1).create(fqid, fields).build())
        .unwrap();
}

/// Create topics 1..=n with `meeting_id` and a `weight` equal to the id
pub fn seed_topics(db: &dyn Datastore, n: EntityId, meeting_id: u64) {
    for id in 1..=n {
        create(
            db,
            topic().fqid(id),
            json!({"id": id, "meeting_id": meeting_id, "weight": id, "title": format!("Topic {}", id)}),
        );
    }
}

// ============================================================================
// One-shot HTTP server
// ============================================================================

/// What the server saw
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
}

/// Serve exactly one request with a canned JSON response on a free local port.
///
/// Returns the base URL, a receiver for the captured request and the
/// server thread handle. The server shuts down after the first request.
pub fn one_shot_server(
    status: u16,
    body: &str,
) -> (String, mpsc::Receiver<CapturedRequest>, JoinHandle<()>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    let status = StatusCode::from_u16(status).unwrap();
    let body = body.to_string();

    let handle = thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let served = Arc::new(Notify::new());
            let shutdown = Arc::clone(&served);

            let app = Router::new().fallback(move |method: Method, uri: Uri, raw: Bytes| {
                let tx = tx.clone();
                let served = Arc::clone(&served);
                let body = body.clone();
                async move {
                    let _ = tx.send(CapturedRequest {
                        method: method.to_string(),
                        path: uri.path().to_string(),
                        body: serde_json::from_slice(&raw).unwrap_or(Value::Null),
                    });
                    served.notify_one();
                    (
                        status,
                        [
                            (header::CONTENT_TYPE, "application/json"),
                            (header::CONNECTION, "close"),
                        ],
                        body,
                    )
                }
            });

            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
                .unwrap();
        });
    });

    (url, rx, handle)
}
