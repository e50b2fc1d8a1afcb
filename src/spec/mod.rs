//! # Spec Module
//!
//! Loads an OpenAPI specification and answers path-addressed questions about it.
//!
//! ## Overview
//!
//! The document is kept as a plain `serde_json::Value` tree. Nothing is converted into typed
//! OpenAPI structures; every lookup is a [`NodePath`] walked from the root by
//! [`Specification::resolve`], which follows `$ref` wherever it meets one:
//!
//! - `#/components/schemas/Book` restarts the walk at the root of the current document
//! - `./schemas/author.yml#/properties/id` loads a file next to the current document and
//!   continues in it
//! - files outside the specification's directory are refused with
//!   [`ClientError::Permission`](crate::ClientError::Permission)
//! - reference loops fail with
//!   [`ClientError::CyclicReference`](crate::ClientError::CyclicReference)
//!
//! Built on top of resolution:
//!
//! - [`Specification::operation`] finds an operation by `operationId`
//! - [`Specification::media_type`] picks the documented response for a status and content type
//! - [`Specification::schema`] returns a navigable [`Schema`]
//! - [`group_parameters`] partitions runtime parameters by declared location
//!
//! ## Example
//!
//! ```no_run
//! use brrtclient::spec::Specification;
//! use std::sync::Arc;
//!
//! let spec = Arc::new(Specification::load("openapi.yaml")?);
//! let operation = spec.operation("fetchBook")?.expect("documented operation");
//! let media_type = spec.media_type(&operation.node, "200", None)?;
//! # Ok::<(), brrtclient::ClientError>(())
//! ```

mod document;
mod external;
mod operation;
mod params;
mod path;
mod schema;

pub use document::{Node, Server, Specification};
pub use operation::{MediaType, Operation};
pub use params::{group_parameters, GroupedParameters, ParameterLocation};
pub use path::NodePath;
pub use schema::{Schema, SchemaType};
