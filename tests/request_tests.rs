#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brrtclient::spec::ParameterLocation;
use brrtclient::{Client, ClientError, ModelRegistry, Specification};
use common::fixtures;
use common::transport::{json, ScriptedTransport};
use http::header::{CONTENT_TYPE, COOKIE, USER_AGENT};
use http::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;

fn client(transport: Arc<ScriptedTransport>) -> Client {
    let spec = Arc::new(Specification::load(fixtures::library()).unwrap());
    Client::new(spec, transport).with_model_registry(Arc::new(ModelRegistry::new()))
}

fn offline() -> Client {
    client(Arc::new(ScriptedTransport::default()))
}

#[test]
fn test_path_without_query() {
    let ctx = offline()
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 42}))
        .unwrap();
    assert_eq!(ctx.request().path().unwrap().as_deref(), Some("/books/42"));
    assert_eq!(ctx.request().query().unwrap(), None);
    assert_eq!(
        ctx.url().unwrap().as_deref(),
        Some("http://library.test/v1/books/42")
    );
}

#[test]
fn test_query_round_trips_through_percent_encoding() {
    let ctx = offline()
        .operation("listBooks")
        .unwrap()
        .with_params(json!({"author": "Ursula K. Le Guin & co"}))
        .unwrap();
    let query = ctx.request().query().unwrap().unwrap();
    assert!(!query.contains(' '));
    assert!(!query.contains('&'));

    let decoded: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    assert_eq!(
        decoded,
        vec![("author".to_string(), "Ursula K. Le Guin & co".to_string())]
    );
}

#[test]
fn test_path_values_are_percent_encoded() {
    let ctx = offline()
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": "a/b c"}))
        .unwrap();
    assert_eq!(ctx.request().path().unwrap().as_deref(), Some("/books/a%2Fb%20c"));
}

#[test]
fn test_unbound_path_variable_fails() {
    let err = offline()
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"title": "Dune"}))
        .unwrap()
        .url()
        .unwrap_err();
    assert!(matches!(err, ClientError::Parameter(message) if message.contains("id")));
}

#[test]
fn test_parameters_grouped_by_declared_location() {
    let ctx = offline()
        .operation("listBooks")
        .unwrap()
        .with_params(json!({"author": "Le Guin", "X-Api-Key": "k", "page": 2}))
        .unwrap();
    let grouped = ctx.request().grouped_params().unwrap();

    let header = grouped.get(ParameterLocation::Header).unwrap();
    assert_eq!(header.get("X-Api-Key"), Some(&json!("k")));
    let query = grouped.get(ParameterLocation::Query).unwrap();
    assert_eq!(query.len(), 2);
    assert!(query.contains_key("page"));
    assert!(!grouped.contains(ParameterLocation::Path));
}

#[test]
fn test_null_params_are_rejected() {
    let err = offline()
        .operation("listBooks")
        .unwrap()
        .with_params(serde_json::Value::Null)
        .unwrap_err();
    assert!(matches!(err, ClientError::Parameter(_)));
}

#[test]
fn test_later_headers_win() {
    let ctx = offline()
        .context()
        .unwrap()
        .with_headers([("X", "1")])
        .unwrap()
        .with_headers([("X", "2")])
        .unwrap();
    assert_eq!(ctx.request().headers()["x"], "2");
}

#[test]
fn test_mapping_bodies_merge() {
    let ctx = offline()
        .context()
        .unwrap()
        .with_body(json!({"a": 1}))
        .unwrap()
        .with_body(json!({"b": 2}))
        .unwrap();
    assert_eq!(ctx.request().body(), Some(&json!({"a": 1, "b": 2})));
}

#[test]
fn test_contexts_fork_without_interference() {
    let base = offline().operation("fetchBook").unwrap();
    let dune = base.with_params(json!({"id": "dune"})).unwrap();
    let emma = base
        .with_params(json!({"id": "emma"}))
        .unwrap()
        .with_headers([("X-Trace", "emma")])
        .unwrap();

    assert_eq!(dune.request().path().unwrap().as_deref(), Some("/books/dune"));
    assert_eq!(emma.request().path().unwrap().as_deref(), Some("/books/emma"));
    assert!(dune.request().headers().is_empty());
    assert!(base.request().params().is_empty());
}

#[test]
fn test_execute_sends_built_request() {
    let transport = Arc::new(ScriptedTransport::new([json(
        StatusCode::CREATED,
        r#"{"id": 7, "title": "Dune"}"#,
        None,
    )]));
    let response = client(Arc::clone(&transport))
        .operation("createBook")
        .unwrap()
        .with_body(json!({"title": "Dune"}))
        .unwrap()
        .execute()
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = transport.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, "http://library.test/v1/books");
    assert_eq!(request.headers[CONTENT_TYPE], "application/json");
    assert!(request.headers[USER_AGENT]
        .to_str()
        .unwrap()
        .starts_with("brrtclient/"));
    assert_eq!(request.body.as_deref(), Some(br#"{"title":"Dune"}"#.as_slice()));
}

#[test]
fn test_header_and_cookie_parameters_are_sent() {
    let transport = Arc::new(ScriptedTransport::new([json(StatusCode::OK, "[]", None)]));
    client(Arc::clone(&transport))
        .operation("listBooks")
        .unwrap()
        .with_params(json!({"X-Api-Key": "secret", "author": "Herbert"}))
        .unwrap()
        .execute()
        .unwrap();
    let request = transport.last_request();
    assert_eq!(request.headers["x-api-key"], "secret");
    assert_eq!(request.url, "http://library.test/v1/books?author=Herbert");

    let transport = Arc::new(ScriptedTransport::new([json(StatusCode::OK, "{}", None)]));
    client(Arc::clone(&transport))
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 1, "session": "abc"}))
        .unwrap()
        .execute()
        .unwrap();
    assert_eq!(transport.last_request().headers[COOKIE], "session=abc");
}

#[test]
fn test_unknown_operation_cannot_execute() {
    let transport = Arc::new(ScriptedTransport::default());
    let ctx = client(Arc::clone(&transport)).operation("fetchMagazine").unwrap();
    assert!(ctx.request().operation().is_none());
    assert!(matches!(ctx.execute(), Err(ClientError::Configuration(_))));
    assert!(transport.requests().is_empty());
}

#[test]
fn test_one_attempt_per_execute() {
    let transport = Arc::new(ScriptedTransport::default());
    let err = client(Arc::clone(&transport))
        .operation("fetchBook")
        .unwrap()
        .with_params(json!({"id": 1}))
        .unwrap()
        .execute()
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(transport.requests().len(), 1);
}
