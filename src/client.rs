//! # Client Module
//!
//! The composition root and the fluent surface.
//!
//! ## Overview
//!
//! [`Client`] owns the loaded specification, the transport, the model registry and the
//! optional conditional-request store. [`Client::context`] hands out a [`Context`]: a request
//! context and a response context travelling together, with every `with_*` method returning a
//! new value. [`Context::execute`] performs exactly one HTTP exchange.
//!
//! ```text
//! Client ──context()──▶ Context ──select_operation / with_params / with_body──▶ Context
//!                                                                               │
//!                         Response ◀── Transport::perform ◀── RequestContext ◀──┘ execute()
//!                            │
//!                            └── object() ──▶ ObjectBuilder ──▶ ModelRegistry
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use brrtclient::Client;
//! use serde_json::json;
//!
//! let client = Client::open("openapi.yml")?;
//! let response = client
//!     .operation("fetchBook")?
//!     .with_params(json!({"id": 42}))?
//!     .execute()?;
//! if response.is_success() {
//!     let book = response.object()?;
//!     println!("{:?}", book.as_model().map(|book| book.get("title")));
//! }
//! # Ok::<(), brrtclient::ClientError>(())
//! ```
//!
//! ## Model Registry
//!
//! Unless one is injected with [`Client::with_model_registry`], clients share
//! [`ModelRegistry::global`]. This is the only place the global registry is reached; every
//! builder below gets the registry through its [`ResponseContext`].

use crate::cache::{ConditionalRequest, DiskStore, Store};
use crate::config::ClientConfig;
use crate::content::{Deserializer, Deserializers, Serializer, Serializers};
use crate::error::{ClientError, Result};
use crate::logging::RedactionLevel;
use crate::model::{ModelNaming, ModelRegistry, PropertyNaming};
use crate::request::RequestContext;
use crate::response::{Response, ResponseContext};
use crate::spec::{Operation, Specification};
use crate::transport::{ReqwestTransport, Transport};
use http::HeaderMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, info_span, Dispatch};

/// An OpenAPI-driven HTTP client.
#[derive(Clone)]
pub struct Client {
    spec: Arc<Specification>,
    transport: Arc<dyn Transport>,
    registry: Arc<ModelRegistry>,
    store: Option<Arc<dyn Store>>,
    config: ClientConfig,
}

impl Client {
    /// Load `spec_path` and use the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Client::from_config`].
    pub fn open(spec_path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(spec_path, ClientConfig::default())
    }

    /// Load `spec_path` and apply `config`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Io`] / [`ClientError::Parse`] when the specification cannot be loaded
    /// - [`ClientError::Transport`] when the HTTP client cannot be constructed
    pub fn from_config(spec_path: impl AsRef<Path>, config: ClientConfig) -> Result<Self> {
        let spec = Arc::new(Specification::load(spec_path)?);
        let transport = match config.timeout {
            Some(timeout) => ReqwestTransport::with_timeout(timeout),
            None => ReqwestTransport::new(),
        }
        .map_err(ClientError::Transport)?;
        Ok(Self {
            spec,
            transport: Arc::new(transport),
            registry: ModelRegistry::global(),
            store: disk_store(&config),
            config,
        })
    }

    /// A client over an already loaded specification and a custom transport.
    #[must_use]
    pub fn new(spec: Arc<Specification>, transport: Arc<dyn Transport>) -> Self {
        Self {
            spec,
            transport,
            registry: ModelRegistry::global(),
            store: None,
            config: ClientConfig::default(),
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn with_model_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Enable conditional requests for every context created by this client.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Apply `config` to an existing client.
    ///
    /// A `cache_dir` installs a [`DiskStore`] and a `timeout` replaces the transport with a
    /// [`ReqwestTransport`] using it. Unset fields keep the current store and transport.
    ///
    /// # Errors
    ///
    /// [`ClientError::Transport`] when the HTTP client cannot be constructed.
    pub fn with_config(mut self, config: ClientConfig) -> Result<Self> {
        if let Some(timeout) = config.timeout {
            let transport = ReqwestTransport::with_timeout(timeout).map_err(ClientError::Transport)?;
            self.transport = Arc::new(transport);
        }
        if let Some(store) = disk_store(&config) {
            self.store = Some(store);
        }
        self.config = config;
        Ok(self)
    }

    #[must_use]
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    #[must_use]
    pub fn model_registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A fresh context with the client's configuration applied.
    ///
    /// # Errors
    ///
    /// See [`RequestContext::new`].
    pub fn context(&self) -> Result<Context> {
        let mut request = RequestContext::new(Arc::clone(&self.spec))?
            .with_user_agent(self.config.user_agent.as_str());
        if let Some(base_url) = &self.config.base_url {
            request = request.with_base_url(base_url.as_str());
        }
        Ok(Context {
            request,
            response: ResponseContext::new(Arc::clone(&self.registry)),
            transport: Arc::clone(&self.transport),
            store: self.store.as_ref().map(Arc::clone),
        })
    }

    /// Shorthand for `context()?.select_operation(operation_id)`.
    ///
    /// # Errors
    ///
    /// See [`Client::context`].
    pub fn operation(&self, operation_id: &str) -> Result<Context> {
        self.context()?.select_operation(operation_id)
    }
}

fn disk_store(config: &ClientConfig) -> Option<Arc<dyn Store>> {
    config
        .cache_dir
        .as_ref()
        .map(|dir| Arc::new(DiskStore::new(dir)) as Arc<dyn Store>)
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("specification", &self.spec.file())
            .field("conditional_requests", &self.store.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Request and response configuration for one call chain.
///
/// Values, like the contexts they wrap: forks never affect each other.
#[derive(Clone)]
pub struct Context {
    request: RequestContext,
    response: ResponseContext,
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn Store>>,
}

impl Context {
    #[must_use]
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    #[must_use]
    pub fn response_context(&self) -> &ResponseContext {
        &self.response
    }

    #[must_use]
    pub fn has_conditional_requests(&self) -> bool {
        self.store.is_some()
    }

    fn with_request(&self, request: RequestContext) -> Self {
        Self {
            request,
            ..self.clone()
        }
    }

    fn with_response(&self, response: ResponseContext) -> Self {
        Self {
            response,
            ..self.clone()
        }
    }

    /// # Errors
    ///
    /// See [`RequestContext::select_operation`].
    pub fn select_operation(&self, operation_id: &str) -> Result<Self> {
        Ok(self.with_request(self.request.select_operation(operation_id)?))
    }

    #[must_use]
    pub fn with_operation(&self, operation: Operation) -> Self {
        self.with_request(self.request.with_operation(operation))
    }

    /// # Errors
    ///
    /// See [`RequestContext::with_params`].
    pub fn with_params(&self, params: Value) -> Result<Self> {
        Ok(self.with_request(self.request.with_params(params)?))
    }

    /// # Errors
    ///
    /// See [`RequestContext::with_headers`].
    pub fn with_headers<I, K, V>(&self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(self.with_request(self.request.with_headers(headers)?))
    }

    /// # Errors
    ///
    /// See [`RequestContext::with_body`].
    pub fn with_body(&self, body: Value) -> Result<Self> {
        Ok(self.with_request(self.request.with_body(body)?))
    }

    #[must_use]
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        self.with_request(self.request.with_base_url(base_url))
    }

    #[must_use]
    pub fn with_logger(&self, logger: Dispatch) -> Self {
        self.with_request(self.request.with_logger(logger))
    }

    #[must_use]
    pub fn with_user_agent(&self, user_agent: impl Into<String>) -> Self {
        self.with_request(self.request.with_user_agent(user_agent))
    }

    #[must_use]
    pub fn with_redaction(&self, redaction: RedactionLevel) -> Self {
        self.with_request(self.request.with_redaction(redaction))
    }

    #[must_use]
    pub fn with_serializers(&self, serializers: Serializers) -> Self {
        self.with_request(self.request.with_serializers(serializers))
    }

    #[must_use]
    pub fn with_serializer(&self, content_type: impl Into<String>, serializer: Arc<dyn Serializer>) -> Self {
        self.with_request(self.request.with_serializer(content_type, serializer))
    }

    #[must_use]
    pub fn with_deserializers(&self, deserializers: Deserializers) -> Self {
        self.with_response(self.response.with_deserializers(deserializers))
    }

    #[must_use]
    pub fn with_deserializer(&self, content_type: impl Into<String>, deserializer: Arc<dyn Deserializer>) -> Self {
        self.with_response(self.response.with_deserializer(content_type, deserializer))
    }

    #[must_use]
    pub fn with_model_registry(&self, registry: Arc<ModelRegistry>) -> Self {
        self.with_response(self.response.with_model_registry(registry))
    }

    #[must_use]
    pub fn with_model_naming(&self, naming: Arc<dyn ModelNaming>) -> Self {
        self.with_response(self.response.with_model_naming(naming))
    }

    #[must_use]
    pub fn with_property_naming(&self, naming: Arc<dyn PropertyNaming>) -> Self {
        self.with_response(self.response.with_property_naming(naming))
    }

    #[must_use]
    pub fn with_transport(&self, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            ..self.clone()
        }
    }

    /// Send validators and reuse bodies through `store`.
    #[must_use]
    pub fn with_conditional_requests(&self, store: Arc<dyn Store>) -> Self {
        Self {
            store: Some(store),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn without_conditional_requests(&self) -> Self {
        Self {
            store: None,
            ..self.clone()
        }
    }

    /// # Errors
    ///
    /// See [`RequestContext::url`].
    pub fn url(&self) -> Result<Option<String>> {
        self.request.url()
    }

    /// Perform the request and wrap the response.
    ///
    /// Runs under the context's logger when one is set.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Configuration`] without an operation or base URL
    /// - [`ClientError::Parameter`] for unbound path variables
    /// - [`ClientError::Transport`] when the exchange fails
    /// - [`ClientError::Store`] when the conditional-request store fails
    pub fn execute(&self) -> Result<Response> {
        match self.request.logger() {
            Some(logger) => tracing::dispatcher::with_default(logger, || self.perform()),
            None => self.perform(),
        }
    }

    fn perform(&self) -> Result<Response> {
        let operation = self.request.operation().cloned();
        let span = info_span!(
            "execute",
            method = operation.as_ref().map(|op| op.verb.as_str()),
            path = operation.as_ref().map(|op| op.path.as_str()),
        );
        let _entered = span.enter();

        let full_path = match &operation {
            Some(_) => self.request.full_path()?,
            None => None,
        };
        let conditional = self.store.as_deref().zip(full_path.as_deref());
        let validators = match conditional {
            Some((store, path)) => ConditionalRequest::new(store, path).headers()?,
            None => HeaderMap::new(),
        };

        let request = self.request.to_http_request(&validators)?;
        let raw = self
            .transport
            .perform(request)
            .map_err(ClientError::Transport)?;
        info!(status = raw.status.as_u16(), bytes = raw.body.len(), "Received response");

        let spec = Arc::clone(self.request.specification());
        match conditional {
            Some((store, path)) => {
                Response::conditional(spec, operation, self.response.clone(), raw, store, path)
            }
            None => Ok(Response::new(spec, operation, self.response.clone(), raw)),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("conditional_requests", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
