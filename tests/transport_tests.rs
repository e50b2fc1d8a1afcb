#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brrtclient::transport::{HttpRequest, ReqwestTransport, Transport};
use brrtclient::{Client, ModelRegistry, Specification};
use common::fixtures;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the mock server saw: request line, lowercased headers and body.
struct Received {
    request_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Received {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Accept one connection, answer with `response` and hand back the request.
fn serve_once(response: &'static str) -> (String, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').unwrap();
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
        let length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .map_or(0, |(_, value)| value.parse().unwrap());
        let mut body = vec![0; length];
        reader.read_exact(&mut body).unwrap();

        let mut stream = stream;
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        Received {
            request_line: request_line.trim_end().to_string(),
            headers,
            body,
        }
    });
    (base_url, handle)
}

#[test]
fn test_reqwest_transport_round_trip() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 418 I'm a teapot\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nshort",
    );
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("x-trace", HeaderValue::from_static("abc"));

    let transport = ReqwestTransport::with_timeout(Duration::from_secs(5)).unwrap();
    let response = transport
        .perform(HttpRequest {
            method: Method::PUT,
            url: format!("{base_url}/kettles/1?strength=3"),
            headers,
            body: Some(br#"{"on":true}"#.to_vec()),
        })
        .unwrap();

    assert_eq!(response.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(response.headers[CONTENT_TYPE], "text/plain");
    assert_eq!(response.body, b"short");

    let received = server.join().unwrap();
    assert_eq!(received.request_line, "PUT /kettles/1?strength=3 HTTP/1.1");
    assert_eq!(received.header("x-trace"), Some("abc"));
    assert_eq!(received.body, br#"{"on":true}"#);
}

#[test]
fn test_connection_failure_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = ReqwestTransport::with_timeout(Duration::from_secs(2)).unwrap();
    let err = transport
        .perform(HttpRequest {
            method: Method::GET,
            url: format!("http://{addr}/"),
            headers: HeaderMap::new(),
            body: None,
        })
        .unwrap_err();
    assert!(err.to_string().contains("GET"), "{err:#}");
}

#[test]
fn test_client_against_live_server() {
    let body = r#"{"id": 3, "title": "Solaris", "tags": ["classic", "polish"]}"#;
    let response: &'static str = Box::leak(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .into_boxed_str(),
    );
    let (base_url, server) = serve_once(response);

    let spec = Arc::new(Specification::load(fixtures::library()).unwrap());
    let transport = ReqwestTransport::with_timeout(Duration::from_secs(5)).unwrap();
    let response = Client::new(spec, Arc::new(transport))
        .with_model_registry(Arc::new(ModelRegistry::new()))
        .operation("fetchBook")
        .unwrap()
        .with_base_url(format!("{base_url}/v2/"))
        .with_params(json!({"id": 3, "session": "s1"}))
        .unwrap()
        .execute()
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.content_type(), Some("application/json"));
    let book = response.object().unwrap().as_model().unwrap().clone();
    assert_eq!(book.model_name(), Some("Book"));
    assert_eq!(book.get("title").unwrap().as_str(), Some("Solaris"));
    let tags = book.get("tags").unwrap();
    let tags: Vec<_> = tags
        .as_collection()
        .unwrap()
        .iter()
        .map(|tag| tag.as_str().unwrap().to_string())
        .collect();
    assert_eq!(tags, ["classic", "polish"]);

    let received = server.join().unwrap();
    assert_eq!(received.request_line, "GET /v2/books/3 HTTP/1.1");
    assert_eq!(received.header("cookie"), Some("session=s1"));
    assert!(received.header("user-agent").unwrap().starts_with("brrtclient/"));
}
