#![allow(dead_code)]

pub mod fixtures {
    use std::path::PathBuf;

    /// Path of a specification under `tests/fixtures/openapi`.
    pub fn spec_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("openapi")
            .join(name)
    }

    pub fn library() -> PathBuf {
        spec_path("library.yml")
    }

    pub fn naming() -> PathBuf {
        spec_path("naming.yml")
    }
}

pub mod transport {
    use brrtclient::transport::{HttpRequest, HttpResponse, Transport};
    use http::header::{HeaderValue, CONTENT_TYPE, ETAG};
    use http::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every request it sees.
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn new<I: IntoIterator<Item = HttpResponse>>(responses: I) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().expect("no request was sent")
        }
    }

    impl Transport for ScriptedTransport {
        fn perform(&self, request: HttpRequest) -> anyhow::Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted response left"))
        }
    }

    /// A JSON response with an optional `ETag`.
    pub fn json(status: StatusCode, body: &str, etag: Option<&str>) -> HttpResponse {
        let mut response = HttpResponse::new(status);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(etag) = etag {
            response.headers.insert(ETAG, HeaderValue::from_str(etag).unwrap());
        }
        response.body = body.as_bytes().to_vec();
        response
    }

    /// A bodiless response.
    pub fn empty(status: StatusCode) -> HttpResponse {
        HttpResponse::new(status)
    }
}

pub mod store {
    use brrtclient::cache::Store;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    /// In-memory [`Store`] for conditional request tests.
    #[derive(Default)]
    pub struct MemoryStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStore {
        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }
    }

    impl Store for MemoryStore {
        fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn write(&self, key: &str, value: &[u8]) -> io::Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn clear(&self) -> io::Result<()> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }
}
