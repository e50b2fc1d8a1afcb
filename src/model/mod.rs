//! # Model Module
//!
//! Turns decoded payloads into schema-shaped objects at run time.
//!
//! ## Overview
//!
//! No code is generated ahead of time. When a response is built against an object schema the
//! [`ObjectBuilder`] asks the context's [`ModelNaming`] for the schema's name, qualifies it with
//! the namespace of enclosing models and fetches (or creates) the matching [`ModelType`] from the
//! [`ModelRegistry`]. A model type is a field-access descriptor: the declared properties and
//! their types. Instances are [`Model`]s that wrap the payload map.
//!
//! ```text
//! payload + Schema ──► ObjectBuilder ──► ModelNaming ──► "Library::Books::Book"
//!                            │                                   │
//!                            ▼                                   ▼
//!                     Model / Collection ◄───────────── ModelRegistry (Mutex)
//! ```
//!
//! ## Naming
//!
//! - [`SpecificationModelNaming`] (default): `title`, then the `$ref` that reached the schema,
//!   then the schema's position in the document
//! - [`OperationModelNaming`]: names derived from the operation id
//! - [`NodeModelNaming`]: the node path itself
//!
//! A collection whose name equals its item's name is suffixed with `Collection`.
//!
//! ## Attribute access
//!
//! Payload keys are available under their original name and under the name given by the
//! context's [`PropertyNaming`] ([`SnakeCase`] by default). A missing key is a
//! [`ClientError::Attribute`](crate::ClientError::Attribute); a key with a `null` value is
//! [`Object::Null`].

mod builder;
mod naming;
mod object;
mod property_naming;
mod registry;
mod types;

pub use builder::ObjectBuilder;
pub use naming::{
    ref_model_name, title_model_name, ModelNaming, NodeModelNaming, OperationModelNaming,
    SpecificationModelNaming,
};
pub use object::{Collection, Model, Object};
pub use property_naming::{PropertyNaming, SnakeCase};
pub use registry::ModelRegistry;
pub use types::{qualified_name, ModelKind, ModelType, Property};
