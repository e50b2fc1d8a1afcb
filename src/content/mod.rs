//! # Content Module
//!
//! Request body serializers, response body deserializers, and the negotiation that picks a
//! serializer for an operation.
//!
//! Encoding itself is left to implementations of [`Serializer`] and [`Deserializer`]; tables
//! map a content type to one of them. A request body is serialized with the first content type
//! declared under the operation's `requestBody.content` that has a registered serializer.

mod json;
mod text;

pub use json::ApplicationJson;
pub use text::TextPlain;

use crate::error::Result;
use http::HeaderMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Output of a [`Serializer`]: the body bytes plus the headers that describe them.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub headers: HeaderMap,
}

/// Encodes request data into a body.
pub trait Serializer: Send + Sync {
    /// # Errors
    ///
    /// [`ClientError::Codec`](crate::ClientError::Codec) when `data` cannot be encoded.
    fn serialize(&self, data: &Value) -> Result<SerializedBody>;
}

/// Decodes a response body.
pub trait Deserializer: Send + Sync {
    /// # Errors
    ///
    /// [`ClientError::Codec`](crate::ClientError::Codec) when `body` is not valid for the
    /// content type.
    fn deserialize(&self, body: &[u8], headers: &HeaderMap) -> Result<Value>;
}

/// Content type → serializer.
pub type Serializers = HashMap<String, Arc<dyn Serializer>>;

/// Content type → deserializer.
pub type Deserializers = HashMap<String, Arc<dyn Deserializer>>;

/// `application/json` and `text/plain` serializers.
#[must_use]
pub fn default_serializers() -> Serializers {
    let mut serializers: Serializers = HashMap::new();
    serializers.insert("application/json".to_string(), Arc::new(ApplicationJson));
    serializers.insert("text/plain".to_string(), Arc::new(TextPlain));
    serializers
}

/// The `application/json` deserializer.
#[must_use]
pub fn default_deserializers() -> Deserializers {
    let mut deserializers: Deserializers = HashMap::new();
    deserializers.insert("application/json".to_string(), Arc::new(ApplicationJson));
    deserializers
}

/// A content type chosen for a request body together with its serializer.
#[derive(Clone)]
pub struct SerializerSelection {
    pub content_type: String,
    pub serializer: Arc<dyn Serializer>,
}

impl std::fmt::Debug for SerializerSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerSelection")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Pick the first declared content type that has a registered serializer.
///
/// `declared` is in specification order. Returns `None` when nothing matches; the body is
/// then sent as is.
#[must_use]
pub fn pick_serializer(declared: &[String], serializers: &Serializers) -> Option<SerializerSelection> {
    declared.iter().find_map(|content_type| {
        serializers
            .get(content_type)
            .map(|serializer| SerializerSelection {
                content_type: content_type.clone(),
                serializer: Arc::clone(serializer),
            })
    })
}

/// Bytes for a body that has no serializer: strings as is, anything else as compact JSON.
#[must_use]
pub fn opaque_body(data: &Value) -> Vec<u8> {
    match data {
        Value::String(text) => text.clone().into_bytes(),
        other => other.to_string().into_bytes(),
    }
}

/// The media type of a `Content-Type` header value, without parameters.
///
/// `application/json; charset=utf-8` → `application/json`
#[must_use]
pub fn media_type_of(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}
