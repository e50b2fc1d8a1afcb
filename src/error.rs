//! # Error Module
//!
//! A single error type for everything the client can fail on. Variants map onto the
//! failure classes a caller has to tell apart:
//!
//! - **Load time**: [`ClientError::Io`], [`ClientError::Parse`]
//! - **Reference resolution**: [`ClientError::Permission`], [`ClientError::CyclicReference`]
//! - **Request configuration**: [`ClientError::Parameter`], [`ClientError::Body`],
//!   [`ClientError::Configuration`]
//! - **Response building**: [`ClientError::TypeMismatch`], [`ClientError::UnknownContentType`],
//!   [`ClientError::Attribute`], [`ClientError::Codec`]
//! - **Collaborators**: [`ClientError::Transport`], [`ClientError::Store`]
//!
//! Dangling references, unknown operation ids and undocumented response codes are not errors;
//! lookups for those return `Ok(None)`.

use std::path::PathBuf;

/// Maximum number of characters of a payload fragment quoted in a [`ClientError::TypeMismatch`].
const FRAGMENT_LIMIT: usize = 120;

/// Errors raised while loading a specification, configuring a request or building a response.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A specification (or externally referenced) file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A specification document is not valid YAML or JSON.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Document that failed to parse
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// A `$ref` resolved to a file outside the specification's base directory.
    #[error("reference {reference:?} resolves to {path}, outside of {base}")]
    Permission {
        /// The `$ref` value as written in the document
        reference: String,
        /// Where the reference would have led
        path: PathBuf,
        /// The directory references are confined to
        base: PathBuf,
    },

    /// A `$ref` chain returned to a state it already visited.
    #[error("cyclic reference {reference:?} while resolving /{path}")]
    CyclicReference {
        /// The `$ref` that closed the cycle
        reference: String,
        /// The node path being resolved
        path: String,
    },

    /// Runtime parameters were null, malformed, or a URL template variable was unbound.
    #[error("parameter error: {0}")]
    Parameter(String),

    /// A non-mapping body was assigned to a context that already carries a body.
    #[error("cannot assign body: {0}")]
    Body(String),

    /// The context cannot be executed as configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The payload shape disagrees with the schema.
    #[error("type mismatch for {model}: expected {expected}, got {fragment}")]
    TypeMismatch {
        /// Model (or schema) name being built
        model: String,
        /// Shape the schema declares
        expected: &'static str,
        /// The offending payload fragment, truncated
        fragment: String,
    },

    /// A serializer or deserializer rejected the data it was given.
    #[error("codec error: {0}")]
    Codec(String),

    /// No deserializer is registered for a response content type.
    #[error("no deserializer registered for content type {0:?}")]
    UnknownContentType(String),

    /// A model attribute was accessed that is not present in the payload.
    #[error("undefined attribute {name:?} for {model}")]
    Attribute {
        /// Model name
        model: String,
        /// Attribute that was requested
        name: String,
    },

    /// The transport collaborator failed to perform the request.
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    /// The cache store collaborator failed.
    #[error("store error: {0}")]
    Store(#[from] std::io::Error),
}

impl ClientError {
    /// Build a [`ClientError::TypeMismatch`] quoting a bounded fragment of `payload`.
    pub fn type_mismatch(
        model: impl Into<String>,
        expected: &'static str,
        payload: &serde_json::Value,
    ) -> Self {
        let mut fragment = payload.to_string();
        if fragment.chars().count() > FRAGMENT_LIMIT {
            fragment = fragment.chars().take(FRAGMENT_LIMIT).collect::<String>() + "…";
        }
        ClientError::TypeMismatch {
            model: model.into(),
            expected,
            fragment,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
