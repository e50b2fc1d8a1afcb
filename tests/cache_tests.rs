#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brrtclient::cache::{fingerprint, ConditionalRequest, DiskStore, Store};
use brrtclient::{Client, ModelRegistry, Specification};
use common::fixtures;
use common::store::MemoryStore;
use common::transport::{empty, json, ScriptedTransport};
use http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::StatusCode;
use serde_json::json;
use std::sync::Arc;

const BOOK: &str = r#"{"id": 42, "title": "Dune", "tags": ["classic"]}"#;

fn client<S: Store + 'static>(transport: &Arc<ScriptedTransport>, store: Arc<S>) -> Client {
    let spec = Arc::new(Specification::load(fixtures::library()).unwrap());
    let transport: Arc<ScriptedTransport> = Arc::clone(transport);
    Client::new(spec, transport)
        .with_model_registry(Arc::new(ModelRegistry::new()))
        .with_store(store)
}

#[test]
fn test_not_modified_reuses_cached_body() {
    let transport = Arc::new(ScriptedTransport::new([
        json(StatusCode::OK, BOOK, Some("\"v1\"")),
        empty(StatusCode::NOT_MODIFIED),
    ]));
    let store = Arc::new(MemoryStore::default());
    let fetch = client(&transport, Arc::clone(&store))
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 42}))
        .unwrap();
    assert!(fetch.has_conditional_requests());

    let first = fetch.execute().unwrap();
    assert!(!first.is_cached());
    assert!(transport.requests()[0].headers.get(IF_NONE_MATCH).is_none());

    let second = fetch.execute().unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert!(second.is_cached());
    assert_eq!(transport.requests()[1].headers[IF_NONE_MATCH], "\"v1\"");

    let original = first.object().unwrap().to_value();
    let replayed = second.object().unwrap().to_value();
    assert_eq!(original, replayed);

    let first = first.object().unwrap().as_model().unwrap().clone();
    let second = second.object().unwrap().as_model().unwrap().clone();
    assert!(Arc::ptr_eq(
        first.model_type().unwrap(),
        second.model_type().unwrap()
    ));
    assert_eq!(second.get("title").unwrap().as_str(), Some("Dune"));
}

#[test]
fn test_entries_are_keyed_by_full_path() {
    let transport = Arc::new(ScriptedTransport::new([json(
        StatusCode::OK,
        "[]",
        Some("\"page-2\""),
    )]));
    let store = Arc::new(MemoryStore::default());
    client(&transport, Arc::clone(&store))
        .operation("listBooks")
        .unwrap()
        .with_params(json!({"author": "Herbert"}))
        .unwrap()
        .execute()
        .unwrap();

    let key = fingerprint("/books?author=Herbert");
    assert_eq!(
        store.keys(),
        vec![format!("{key}.data"), format!("{key}.info")]
    );
    let headers = ConditionalRequest::new(store.as_ref(), "/books?author=Herbert")
        .headers()
        .unwrap();
    assert_eq!(headers[IF_NONE_MATCH], "\"page-2\"");
    assert!(ConditionalRequest::new(store.as_ref(), "/books")
        .headers()
        .unwrap()
        .is_empty());
}

#[test]
fn test_responses_without_etag_are_not_cached() {
    let transport = Arc::new(ScriptedTransport::new([json(StatusCode::OK, BOOK, None)]));
    let store = Arc::new(MemoryStore::default());
    client(&transport, Arc::clone(&store))
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 42}))
        .unwrap()
        .execute()
        .unwrap();
    assert!(store.keys().is_empty());
}

#[test]
fn test_disk_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DiskStore::new(dir.path().join("cache")));

    let mut ok = json(StatusCode::OK, BOOK, Some("W/\"abc\""));
    ok.headers.insert(
        http::header::LAST_MODIFIED,
        http::HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
    );
    let transport = Arc::new(ScriptedTransport::new([ok, empty(StatusCode::NOT_MODIFIED)]));
    let fetch = client(&transport, Arc::clone(&store))
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 42}))
        .unwrap();

    fetch.execute().unwrap();
    let replay = fetch.execute().unwrap();

    let requests = transport.requests();
    let sent = &requests[1].headers;
    assert_eq!(sent[IF_NONE_MATCH], "W/\"abc\"");
    assert_eq!(sent[IF_MODIFIED_SINCE], "Wed, 21 Oct 2015 07:28:00 GMT");
    assert_eq!(replay.body(), BOOK.as_bytes());

    store.clear().unwrap();
    assert!(!dir.path().join("cache").exists());
}

#[test]
fn test_not_modified_without_cache_entry_keeps_empty_body() {
    let transport = Arc::new(ScriptedTransport::new([empty(StatusCode::NOT_MODIFIED)]));
    let store = Arc::new(MemoryStore::default());
    let response = client(&transport, store)
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 42}))
        .unwrap()
        .execute()
        .unwrap();
    assert!(!response.is_cached());
    assert!(response.object().unwrap().is_null());
}

#[test]
fn test_conditional_requests_can_be_disabled_per_context() {
    let transport = Arc::new(ScriptedTransport::new([json(StatusCode::OK, BOOK, Some("\"v1\""))]));
    let store = Arc::new(MemoryStore::default());
    client(&transport, Arc::clone(&store))
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 42}))
        .unwrap()
        .without_conditional_requests()
        .execute()
        .unwrap();
    assert!(store.keys().is_empty());
}
