use super::template::{build_query, expand, scalar_text};
use crate::content::{default_serializers, opaque_body, pick_serializer, Serializer, Serializers};
use crate::config::DEFAULT_USER_AGENT;
use crate::error::{ClientError, Result};
use crate::logging::{redact_headers, RedactionLevel};
use crate::spec::{group_parameters, GroupedParameters, Operation, ParameterLocation, Specification};
use crate::transport::HttpRequest;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use http::HeaderMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn, Dispatch};

/// Immutable request configuration.
///
/// Every `with_*` / `select_*` method returns a modified copy and leaves `self` untouched, so a
/// partially configured context can be shared and forked into independent call chains.
///
/// # Example
///
/// ```rust,no_run
/// use brrtclient::request::RequestContext;
/// use brrtclient::Specification;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let spec = Arc::new(Specification::load("openapi.yml")?);
/// let books = RequestContext::new(spec)?.select_operation("fetchBook")?;
/// let first = books.with_params(json!({"id": 1}))?;
/// let second = books.with_params(json!({"id": 2}))?;
/// assert_ne!(first.url()?, second.url()?);
/// # Ok::<(), brrtclient::ClientError>(())
/// ```
#[derive(Clone)]
pub struct RequestContext {
    spec: Arc<Specification>,
    base_url: Option<String>,
    operation: Option<Operation>,
    params: Map<String, Value>,
    headers: HeaderMap,
    body: Option<Value>,
    logger: Option<Dispatch>,
    serializers: Serializers,
    user_agent: String,
    redaction: RedactionLevel,
}

impl RequestContext {
    /// A context for `spec` with the first declared server as base URL.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn new(spec: Arc<Specification>) -> Result<Self> {
        let base_url = spec.default_base_url()?;
        Ok(Self {
            spec,
            base_url,
            operation: None,
            params: Map::new(),
            headers: HeaderMap::new(),
            body: None,
            logger: None,
            serializers: default_serializers(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            redaction: RedactionLevel::default(),
        })
    }

    #[must_use]
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    #[must_use]
    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn logger(&self) -> Option<&Dispatch> {
        self.logger.as_ref()
    }

    #[must_use]
    pub fn serializers(&self) -> &Serializers {
        &self.serializers
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn redaction(&self) -> RedactionLevel {
        self.redaction
    }

    /// Select the operation with the given `operationId`.
    ///
    /// An unknown id is a documentation gap, not an error: it is logged and the copy carries no
    /// operation, which [`Client`](crate::Client) reports when executing.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn select_operation(&self, operation_id: &str) -> Result<Self> {
        let operation = self.spec.operation(operation_id)?;
        if operation.is_none() {
            warn!(operation_id, "Unknown operation id");
        }
        Ok(Self {
            operation,
            ..self.clone()
        })
    }

    /// Use an operation found elsewhere, e.g. via [`Specification::operation`].
    #[must_use]
    pub fn with_operation(&self, operation: Operation) -> Self {
        Self {
            operation: Some(operation),
            ..self.clone()
        }
    }

    /// Merge runtime parameters; later values win.
    ///
    /// # Errors
    ///
    /// [`ClientError::Parameter`] when `params` is null or not a mapping.
    pub fn with_params(&self, params: Value) -> Result<Self> {
        let params = match params {
            Value::Object(map) => map,
            Value::Null => {
                return Err(ClientError::Parameter(
                    "parameters must be a mapping, got null".to_string(),
                ))
            }
            other => {
                return Err(ClientError::Parameter(format!(
                    "parameters must be a mapping, got {other}"
                )))
            }
        };
        let mut merged = self.params.clone();
        merged.extend(params);
        Ok(Self {
            params: merged,
            ..self.clone()
        })
    }

    /// Set headers; a header already present is replaced.
    ///
    /// # Errors
    ///
    /// [`ClientError::Parameter`] when a name or value is not a valid HTTP header.
    pub fn with_headers<I, K, V>(&self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut merged = self.headers.clone();
        for (name, value) in headers {
            let (name, value) = (name.as_ref(), value.as_ref());
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Parameter(format!("invalid header name {name:?}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Parameter(format!("invalid value for header {name}")))?;
            merged.insert(header, value);
        }
        Ok(Self {
            headers: merged,
            ..self.clone()
        })
    }

    /// Set the request body.
    ///
    /// Mappings merge into an existing mapping body, later keys winning.
    ///
    /// # Errors
    ///
    /// [`ClientError::Body`] when a body is already set and either it or `body` is not a mapping.
    pub fn with_body(&self, body: Value) -> Result<Self> {
        let body = match (&self.body, body) {
            (None, body) => body,
            (Some(Value::Object(existing)), Value::Object(addition)) => {
                let mut merged = existing.clone();
                merged.extend(addition);
                Value::Object(merged)
            }
            (Some(_), _) => {
                return Err(ClientError::Body(
                    "a non-mapping body can only be assigned once".to_string(),
                ))
            }
        };
        Ok(Self {
            body: Some(body),
            ..self.clone()
        })
    }

    #[must_use]
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..self.clone()
        }
    }

    /// Run execution under `logger` instead of the default dispatcher.
    #[must_use]
    pub fn with_logger(&self, logger: Dispatch) -> Self {
        Self {
            logger: Some(logger),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_serializers(&self, serializers: Serializers) -> Self {
        Self {
            serializers,
            ..self.clone()
        }
    }

    /// Register one more serializer, replacing any for the same content type.
    #[must_use]
    pub fn with_serializer(&self, content_type: impl Into<String>, serializer: Arc<dyn Serializer>) -> Self {
        let mut copy = self.clone();
        copy.serializers.insert(content_type.into(), serializer);
        copy
    }

    #[must_use]
    pub fn with_user_agent(&self, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_redaction(&self, redaction: RedactionLevel) -> Self {
        Self {
            redaction,
            ..self.clone()
        }
    }

    /// Parameters grouped by declared location. Without an operation everything is a query
    /// parameter.
    ///
    /// # Errors
    ///
    /// See [`group_parameters`].
    pub fn grouped_params(&self) -> Result<GroupedParameters> {
        match &self.operation {
            Some(operation) => group_parameters(&self.spec, &operation.node, &Value::Object(self.params.clone())),
            None => Ok(GroupedParameters::query_only(&self.params)),
        }
    }

    /// The operation's path template with path parameters expanded.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no operation is selected.
    ///
    /// # Errors
    ///
    /// [`ClientError::Parameter`] when a template variable has no value.
    pub fn path(&self) -> Result<Option<String>> {
        let Some(operation) = &self.operation else {
            return Ok(None);
        };
        let grouped = self.grouped_params()?;
        expand(&operation.path, grouped.get(ParameterLocation::Path)).map(Some)
    }

    /// Percent-encoded query string, `None` when there are no query parameters.
    ///
    /// # Errors
    ///
    /// See [`RequestContext::grouped_params`].
    pub fn query(&self) -> Result<Option<String>> {
        let grouped = self.grouped_params()?;
        Ok(grouped
            .get(ParameterLocation::Query)
            .filter(|params| !params.is_empty())
            .map(build_query))
    }

    /// Path plus `?query` when there is one. This is what the conditional cache is keyed on.
    ///
    /// # Errors
    ///
    /// See [`RequestContext::path`].
    pub fn full_path(&self) -> Result<Option<String>> {
        let Some(path) = self.path()? else {
            return Ok(None);
        };
        Ok(Some(match self.query()? {
            Some(query) => format!("{path}?{query}"),
            None => path,
        }))
    }

    /// Base URL plus [`RequestContext::full_path`].
    ///
    /// # Returns
    ///
    /// `Ok(None)` without a base URL or without an operation.
    ///
    /// # Errors
    ///
    /// See [`RequestContext::path`].
    pub fn url(&self) -> Result<Option<String>> {
        let Some(base_url) = &self.base_url else {
            return Ok(None);
        };
        Ok(self
            .full_path()?
            .map(|path| format!("{}{path}", base_url.trim_end_matches('/'))))
    }

    /// Build the HTTP request to send.
    ///
    /// Headers are layered, later layers replacing earlier ones: user agent, serializer
    /// headers, header parameters, explicit headers, then `validators` from the conditional
    /// cache. Cookie parameters are folded into one `Cookie` header.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Configuration`] without an operation or base URL
    /// - [`ClientError::Parameter`] for unbound path variables or parameter values that are
    ///   not valid header values
    /// - [`ClientError::Codec`] when the selected serializer rejects the body
    pub fn to_http_request(&self, validators: &HeaderMap) -> Result<HttpRequest> {
        let Some(operation) = &self.operation else {
            return Err(ClientError::Configuration("no operation selected".to_string()));
        };
        let Some(url) = self.url()? else {
            return Err(ClientError::Configuration(format!(
                "no base URL for {} {}",
                operation.verb, operation.path
            )));
        };

        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| ClientError::Configuration(format!("invalid user agent {:?}", self.user_agent)))?;
        headers.insert(USER_AGENT, user_agent);

        let body = match &self.body {
            Some(body) => Some(self.serialize_body(operation, body, &mut headers)?),
            None => None,
        };

        let grouped = self.grouped_params()?;
        if let Some(params) = grouped.get(ParameterLocation::Header) {
            for (name, value) in params {
                let header = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| ClientError::Parameter(format!("invalid header parameter name {name:?}")))?;
                headers.insert(header, parameter_header_value(name, value)?);
            }
        }
        if let Some(params) = grouped.get(ParameterLocation::Cookie) {
            let cookie = params
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(&scalar_text(value))))
                .collect::<Vec<_>>()
                .join("; ");
            let cookie = HeaderValue::from_str(&cookie)
                .map_err(|_| ClientError::Parameter("invalid cookie parameter value".to_string()))?;
            headers.insert(COOKIE, cookie);
        }

        for (name, value) in self.headers.iter().chain(validators.iter()) {
            headers.insert(name.clone(), value.clone());
        }

        info!(method = %operation.verb, url = %url, "Sending request");
        debug!(headers = ?redact_headers(&headers, self.redaction), "Request headers");

        Ok(HttpRequest {
            method: operation.verb.clone(),
            url,
            headers,
            body,
        })
    }

    /// Encode the body with the first declared content type that has a serializer.
    fn serialize_body(&self, operation: &Operation, body: &Value, headers: &mut HeaderMap) -> Result<Vec<u8>> {
        let declared = self.spec.request_content_types(&operation.node)?;
        match pick_serializer(&declared, &self.serializers) {
            Some(selection) => {
                debug!(content_type = %selection.content_type, "Selected request serializer");
                let serialized = selection.serializer.serialize(body)?;
                for (name, value) in &serialized.headers {
                    headers.insert(name.clone(), value.clone());
                }
                if !headers.contains_key(CONTENT_TYPE) {
                    if let Ok(value) = HeaderValue::from_str(&serialized.content_type) {
                        headers.insert(CONTENT_TYPE, value);
                    }
                }
                Ok(serialized.bytes)
            }
            None => {
                if let Some(value) = declared.first().and_then(|ct| HeaderValue::from_str(ct).ok()) {
                    headers.insert(CONTENT_TYPE, value);
                }
                Ok(opaque_body(body))
            }
        }
    }
}

/// Header text for a header parameter; sequences are comma-joined.
fn parameter_header_value(name: &str, value: &Value) -> Result<HeaderValue> {
    let text = match value {
        Value::Array(values) => values.iter().map(scalar_text).collect::<Vec<_>>().join(","),
        other => scalar_text(other),
    };
    HeaderValue::from_str(&text)
        .map_err(|_| ClientError::Parameter(format!("invalid value for header parameter {name}")))
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("base_url", &self.base_url)
            .field("operation", &self.operation)
            .field("params", &self.params)
            .field("headers", &redact_headers(&self.headers, self.redaction))
            .field("body", &self.body)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{AUTHORIZATION, IF_NONE_MATCH};
    use http::Method;
    use serde_json::json;

    fn spec() -> Arc<Specification> {
        Arc::new(Specification::from_value(
            json!({
                "servers": [{"url": "https://api.example.com/v1/"}],
                "paths": {
                    "/books/{id}": {
                        "parameters": [{"name": "id", "in": "path"}],
                        "get": {
                            "operationId": "fetchBook",
                            "parameters": [
                                {"name": "X-Trace", "in": "header"},
                                {"name": "session", "in": "cookie"},
                                {"name": "theme", "in": "cookie"}
                            ]
                        },
                        "put": {
                            "operationId": "updateBook",
                            "requestBody": {
                                "content": {
                                    "application/xml": {},
                                    "application/json": {}
                                }
                            }
                        }
                    },
                    "/covers": {
                        "post": {
                            "operationId": "uploadCover",
                            "requestBody": {"content": {"image/png": {}}}
                        }
                    }
                }
            }),
            "/nonexistent/openapi.yml",
        ))
    }

    fn context() -> RequestContext {
        RequestContext::new(spec()).unwrap()
    }

    #[test]
    fn test_base_url_defaults_to_first_server() {
        assert_eq!(context().base_url(), Some("https://api.example.com/v1/"));
    }

    #[test]
    fn test_select_operation() {
        let ctx = context().select_operation("fetchBook").unwrap();
        let operation = ctx.operation().unwrap();
        assert_eq!(operation.verb, Method::GET);
        assert_eq!(operation.path, "/books/{id}");
        assert!(context().select_operation("nope").unwrap().operation().is_none());
    }

    #[test]
    fn test_forks_do_not_share_state() {
        let base = context().select_operation("fetchBook").unwrap();
        let first = base.with_params(json!({"id": 1})).unwrap();
        let second = base.with_params(json!({"id": 2})).unwrap();
        assert_eq!(first.path().unwrap().as_deref(), Some("/books/1"));
        assert_eq!(second.path().unwrap().as_deref(), Some("/books/2"));
        assert!(base.params().is_empty());
    }

    #[test]
    fn test_path_and_query() {
        let ctx = context()
            .select_operation("fetchBook")
            .unwrap()
            .with_params(json!({"id": 42}))
            .unwrap();
        assert_eq!(ctx.path().unwrap().as_deref(), Some("/books/42"));
        assert_eq!(ctx.query().unwrap(), None);
        assert_eq!(
            ctx.url().unwrap().as_deref(),
            Some("https://api.example.com/v1/books/42")
        );

        let ctx = ctx.with_params(json!({"q": "a b"})).unwrap();
        assert_eq!(ctx.query().unwrap().as_deref(), Some("q=a+b"));
        assert_eq!(ctx.full_path().unwrap().as_deref(), Some("/books/42?q=a+b"));
    }

    #[test]
    fn test_unbound_path_variable() {
        let ctx = context().select_operation("fetchBook").unwrap();
        assert!(matches!(ctx.path(), Err(ClientError::Parameter(_))));
    }

    #[test]
    fn test_params_must_be_a_mapping() {
        assert!(matches!(context().with_params(Value::Null), Err(ClientError::Parameter(_))));
        assert!(matches!(context().with_params(json!([1])), Err(ClientError::Parameter(_))));
        assert!(context().with_params(json!({})).is_ok());
    }

    #[test]
    fn test_headers_replace() {
        let ctx = context()
            .with_headers([("X", "1")])
            .unwrap()
            .with_headers([("X", "2")])
            .unwrap();
        assert_eq!(ctx.headers()["x"], "2");
        assert_eq!(ctx.headers().get_all("x").iter().count(), 1);
        assert!(matches!(
            context().with_headers([("bad header", "1")]),
            Err(ClientError::Parameter(_))
        ));
    }

    #[test]
    fn test_body_merge_and_reassignment() {
        let ctx = context()
            .with_body(json!({"a": 1}))
            .unwrap()
            .with_body(json!({"b": 2, "a": 3}))
            .unwrap();
        assert_eq!(ctx.body(), Some(&json!({"a": 3, "b": 2})));

        let text = context().with_body(json!("raw")).unwrap();
        assert!(matches!(text.with_body(json!("again")), Err(ClientError::Body(_))));
        assert!(matches!(ctx.with_body(json!([1])), Err(ClientError::Body(_))));
    }

    #[test]
    fn test_request_headers_layering() {
        let mut validators = HeaderMap::new();
        validators.insert(IF_NONE_MATCH, HeaderValue::from_static("\"v1\""));
        let request = context()
            .select_operation("fetchBook")
            .unwrap()
            .with_params(json!({"id": 7, "X-Trace": "param", "session": "abc", "theme": "dark"}))
            .unwrap()
            .with_headers([("x-trace", "explicit"), ("authorization", "Bearer t")])
            .unwrap()
            .to_http_request(&validators)
            .unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://api.example.com/v1/books/7");
        assert_eq!(request.headers["x-trace"], "explicit");
        assert_eq!(request.headers[COOKIE], "session=abc; theme=dark");
        assert_eq!(request.headers[IF_NONE_MATCH], "\"v1\"");
        assert_eq!(request.headers[AUTHORIZATION], "Bearer t");
        assert_eq!(request.headers[USER_AGENT], DEFAULT_USER_AGENT);
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_cookie_values_are_percent_encoded() {
        let request = context()
            .select_operation("fetchBook")
            .unwrap()
            .with_params(json!({"id": 7, "session": "abc; theme=light", "theme": "dark mode"}))
            .unwrap()
            .to_http_request(&HeaderMap::new())
            .unwrap();
        assert_eq!(
            request.headers[COOKIE],
            "session=abc%3B%20theme%3Dlight; theme=dark%20mode"
        );
    }

    #[test]
    fn test_body_uses_first_declared_serializer() {
        let request = context()
            .select_operation("updateBook")
            .unwrap()
            .with_params(json!({"id": 1}))
            .unwrap()
            .with_body(json!({"title": "Dune"}))
            .unwrap()
            .to_http_request(&HeaderMap::new())
            .unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.body, Some(br#"{"title":"Dune"}"#.to_vec()));
    }

    #[test]
    fn test_opaque_body_without_serializer() {
        let request = context()
            .select_operation("uploadCover")
            .unwrap()
            .with_body(json!("PNG..."))
            .unwrap()
            .to_http_request(&HeaderMap::new())
            .unwrap();
        assert_eq!(request.headers[CONTENT_TYPE], "image/png");
        assert_eq!(request.body, Some(b"PNG...".to_vec()));
    }

    #[test]
    fn test_cannot_build_without_operation_or_base_url() {
        assert!(matches!(
            context().to_http_request(&HeaderMap::new()),
            Err(ClientError::Configuration(_))
        ));
        let spec = Arc::new(Specification::from_value(
            json!({"paths": {"/ping": {"get": {"operationId": "ping"}}}}),
            "/nonexistent/openapi.yml",
        ));
        let ctx = RequestContext::new(spec).unwrap().select_operation("ping").unwrap();
        assert_eq!(ctx.url().unwrap(), None);
        assert!(matches!(
            ctx.to_http_request(&HeaderMap::new()),
            Err(ClientError::Configuration(_))
        ));
        let ctx = ctx.with_base_url("http://localhost:9000");
        assert_eq!(ctx.url().unwrap().as_deref(), Some("http://localhost:9000/ping"));
    }
}
