//! # Response Module
//!
//! Wraps a raw HTTP response and turns it into objects.
//!
//! ## Overview
//!
//! A [`Response`] keeps the status, headers and body exactly as received and offers three
//! increasingly structured views of the body:
//!
//! 1. [`Response::body`]: raw bytes
//! 2. [`Response::parsed_body`]: decoded by the deserializer registered for the response's
//!    content type (default `application/json` when the server sends none)
//! 3. [`Response::object`]: built against the schema documented for the operation, status code
//!    and content type, see [`ObjectBuilder`]
//!
//! Both decoded views are computed once and memoised.
//!
//! ## Conditional Requests
//!
//! [`Response::conditional`] stores the body of a `200` carrying an `ETag` and substitutes the
//! stored body into a `304`. The status stays `304`, but the object is built from the stored
//! body against the `200` documentation, so callers see the same object either way.

mod context;

pub use context::ResponseContext;

use crate::cache::{ConditionalResponse, Store};
use crate::content::media_type_of;
use crate::error::{ClientError, Result};
use crate::model::{Object, ObjectBuilder};
use crate::spec::{Operation, Specification};
use crate::transport::HttpResponse;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Content type assumed when the server sends none.
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// A received response plus everything needed to build objects from it.
pub struct Response {
    spec: Arc<Specification>,
    operation: Option<Operation>,
    context: ResponseContext,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    cached: bool,
    parsed: OnceCell<Value>,
    object: OnceCell<Object>,
}

impl Response {
    #[must_use]
    pub fn new(
        spec: Arc<Specification>,
        operation: Option<Operation>,
        context: ResponseContext,
        raw: HttpResponse,
    ) -> Self {
        Self {
            spec,
            operation,
            context,
            status: raw.status,
            headers: raw.headers,
            body: raw.body,
            cached: false,
            parsed: OnceCell::new(),
            object: OnceCell::new(),
        }
    }

    /// Like [`Response::new`], passing the response through the conditional cache.
    ///
    /// A `200` with an `ETag` is remembered under `request_path`; a `304` gets the remembered
    /// body. A `304` with nothing remembered keeps its empty body.
    ///
    /// # Errors
    ///
    /// [`ClientError::Store`] when the store fails.
    pub fn conditional(
        spec: Arc<Specification>,
        operation: Option<Operation>,
        context: ResponseContext,
        mut raw: HttpResponse,
        store: &dyn Store,
        request_path: &str,
    ) -> Result<Self> {
        let cache = ConditionalResponse::new(store, request_path);
        let mut cached = false;
        match raw.status {
            StatusCode::OK => {
                cache.remember(&raw)?;
            }
            StatusCode::NOT_MODIFIED => match cache.retrieve()? {
                Some(body) => {
                    debug!(path = request_path, bytes = body.len(), "Using cached body");
                    raw.body = body;
                    cached = true;
                }
                None => warn!(path = request_path, "Not modified but nothing cached"),
            },
            _ => {}
        }
        let mut response = Self::new(spec, operation, context, raw);
        response.cached = cached;
        Ok(response)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    #[must_use]
    pub fn context(&self) -> &ResponseContext {
        &self.context
    }

    /// `true` when the body was substituted from the conditional cache.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cached
    }

    #[must_use]
    pub fn is_informational(&self) -> bool {
        self.status.is_informational()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn is_redirection(&self) -> bool {
        self.status.is_redirection()
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `Content-Type` header without parameters.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(media_type_of)
    }

    /// The body decoded by the deserializer for its content type. An empty body is `null`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnknownContentType`] when no deserializer is registered
    /// - [`ClientError::Codec`] when the deserializer rejects the body
    pub fn parsed_body(&self) -> Result<&Value> {
        self.parsed.get_or_try_init(|| {
            if self.body.is_empty() {
                return Ok(Value::Null);
            }
            let content_type = self.content_type().unwrap_or(DEFAULT_CONTENT_TYPE);
            let deserializer = self
                .context
                .deserializer(content_type)
                .ok_or_else(|| ClientError::UnknownContentType(content_type.to_string()))?;
            deserializer.deserialize(&self.body, &self.headers)
        })
    }

    /// The body built into an [`Object`].
    ///
    /// The schema is the one documented for the operation under this status (`200` for a `304`)
    /// and content type. Without documentation the body is still parsed when possible and
    /// mappings come back as generic models; bodies that cannot be parsed come back as text.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnknownContentType`] for a documented response whose content type has
    ///   no deserializer
    /// - [`ClientError::TypeMismatch`] when the payload disagrees with the schema
    pub fn object(&self) -> Result<&Object> {
        self.object.get_or_try_init(|| self.build_object())
    }

    fn build_object(&self) -> Result<Object> {
        if self.body.is_empty() {
            return Ok(Object::Null);
        }
        let status = if self.status == StatusCode::NOT_MODIFIED {
            StatusCode::OK
        } else {
            self.status
        };
        let media_type = match &self.operation {
            Some(operation) => {
                self.spec
                    .media_type(&operation.node, status.as_str(), self.content_type())?
            }
            None => None,
        };
        let builder = ObjectBuilder::new(&self.context);

        let Some(media_type) = media_type else {
            debug!(status = status.as_u16(), "Undocumented response, building untyped object");
            return Ok(match self.parsed_body() {
                Ok(payload) => builder.build_untyped(payload),
                Err(ClientError::UnknownContentType(_) | ClientError::Codec(_)) => {
                    Object::Value(Value::String(self.text()))
                }
                Err(e) => return Err(e),
            });
        };

        let payload = self.parsed_body()?;
        match self.spec.schema(&media_type.node)? {
            Some(schema) => {
                debug!(
                    status = %media_type.status,
                    content_type = %media_type.content_type,
                    schema = %schema.node(),
                    "Building response object"
                );
                builder.build(&schema, payload)
            }
            None => Ok(builder.build_untyped(payload)),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("operation", &self.operation)
            .field("bytes", &self.body.len())
            .field("cached", &self.cached)
            .finish_non_exhaustive()
    }
}
