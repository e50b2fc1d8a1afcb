//! # Transport Module
//!
//! The seam between the client and the network. A [`Transport`] performs exactly one HTTP
//! exchange per call; retry, backoff and connection management are entirely its own business.
//!
//! [`ReqwestTransport`] is the default implementation on top of `reqwest::blocking`. Tests and
//! hosts with their own HTTP stack implement the trait directly.

use anyhow::Context as _;
use http::{HeaderMap, Method, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// A fully built request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A raw response as received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

/// Performs one HTTP exchange.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Any failure to complete the exchange. HTTP error statuses are not failures.
    fn perform(&self, request: HttpRequest) -> anyhow::Result<HttpResponse>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest) -> anyhow::Result<HttpResponse> + Send + Sync,
{
    fn perform(&self, request: HttpRequest) -> anyhow::Result<HttpResponse> {
        self(request)
    }
}

/// Blocking transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// When the underlying client cannot be constructed (TLS backend initialisation).
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// A transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// See [`ReqwestTransport::new`].
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Use a preconfigured `reqwest` client.
    #[must_use]
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn perform(&self, request: HttpRequest) -> anyhow::Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder
            .send()
            .with_context(|| format!("{} {} failed", request.method, request.url))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .with_context(|| format!("failed to read response body from {}", request.url))?
            .to_vec();
        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            url = %request.url,
            "Received response"
        );
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}
