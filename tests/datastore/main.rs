//! Datastore Client Integration Tests
//!
//! End-to-end tests through the public API:
//! - scenarios: the documented read / filter / conflict / id reservation cases
//! - concurrency: optimistic locking with real threads
//! - http: the HTTP transport against a local one-shot server
//! - actions: action requests over the in-memory datastore

mod common;

mod actions;
mod concurrency;
mod http;
mod scenarios;
