//! # brrtclient
//!
//! **brrtclient** is a runtime HTTP client driven entirely by an
//! [OpenAPI 3.x](https://spec.openapis.org/oas/v3.1.0) specification: point it at a document,
//! pick an operation by `operationId`, and get schema-shaped objects back. There is no code
//! generation step.
//!
//! ## Overview
//!
//! The specification is loaded once and kept as a plain document tree. Everything else is
//! computed from it on demand:
//!
//! - requests are assembled from the operation's path template, the declared parameter
//!   locations and the first request-body content type that has a serializer
//! - responses are decoded by content type and built against the schema documented for the
//!   status code, producing [`Model`]s and [`Collection`]s whose types are synthesised at run
//!   time and cached in a [`ModelRegistry`]
//!
//! ## Architecture
//!
//! - **[`spec`]** - Document loading and `$ref` resolution (internal, external files, contained
//!   to the specification's directory), operations, media types, schemas, parameter grouping
//! - **[`request`]** - Immutable request context, path template expansion, query strings
//! - **[`content`]** - Serializer/deserializer traits and content negotiation
//! - **[`model`]** - Model naming, property naming, model registry and the object builder
//! - **[`response`]** - Response wrapper and response context
//! - **[`cache`]** - ETag / Last-Modified conditional requests over a byte store
//! - **[`transport`]** - The HTTP exchange seam and its `reqwest` implementation
//! - **[`client`]** - [`Client`] and the fluent [`Context`]
//! - **[`config`]** / **[`logging`]** - Environment-driven configuration and `tracing` setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Ctx as Context
//!     participant Spec as Specification
//!     participant Cache as ConditionalRequest
//!     participant T as Transport
//!     participant Resp as Response
//!     participant B as ObjectBuilder
//!     participant R as ModelRegistry
//!
//!     App->>Ctx: select_operation("fetchBook")
//!     Ctx->>Spec: operation("fetchBook")
//!     App->>Ctx: with_params({"id": 42})
//!     App->>Ctx: execute()
//!     Ctx->>Spec: group_parameters / request_content_types
//!     Ctx->>Cache: headers() for /books/42
//!     Ctx->>T: perform(GET /books/42)
//!     T-->>Ctx: HttpResponse
//!     Ctx-->>App: Response
//!     App->>Resp: object()
//!     Resp->>Spec: media_type + schema
//!     Resp->>B: build(schema, payload)
//!     B->>R: get_or_register("Book")
//!     B-->>App: Object::Model(Book)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brrtclient::logging::{init_logging, LogConfig};
//! use brrtclient::Client;
//! use serde_json::json;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env())?;
//!
//!     let client = Client::open("openapi.yml")?;
//!     let books = client
//!         .operation("listBooks")?
//!         .with_params(json!({"author": "Herbert"}))?
//!         .execute()?;
//!
//!     if let Some(books) = books.object()?.as_collection() {
//!         for book in books {
//!             if let Some(book) = book.as_model() {
//!                 println!("{:?}", book.get("title")?);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime Considerations
//!
//! Everything is blocking. The client spawns no threads; contexts are values and can be used
//! from as many threads as the host likes. The model registry is the only shared mutable state
//! and is guarded by a single mutex. Exactly one network attempt is made per
//! [`Context::execute`]; retries belong to the [`transport::Transport`].

pub mod cache;
pub mod client;
pub mod config;
pub mod content;
mod error;
pub mod logging;
pub mod model;
pub mod request;
pub mod response;
pub mod spec;
pub mod transport;

pub use client::{Client, Context};
pub use error::{ClientError, Result};
pub use model::{Collection, Model, ModelRegistry, Object};
pub use response::Response;
pub use spec::{NodePath, Operation, Specification};
