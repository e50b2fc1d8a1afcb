use super::{SerializedBody, Serializer};
use crate::error::Result;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::Value;

/// `text/plain` serializer. Strings are sent verbatim, other values as their JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPlain;

impl TextPlain {
    pub const MIME_TYPE: &'static str = "text/plain";
}

impl Serializer for TextPlain {
    fn serialize(&self, data: &Value) -> Result<SerializedBody> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(Self::MIME_TYPE));
        Ok(SerializedBody {
            content_type: Self::MIME_TYPE.to_string(),
            bytes: super::opaque_body(data),
            headers,
        })
    }
}
