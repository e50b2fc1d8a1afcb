use super::{Deserializer, SerializedBody, Serializer};
use crate::error::{ClientError, Result};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::Value;

/// `application/json` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationJson;

impl ApplicationJson {
    pub const MIME_TYPE: &'static str = "application/json";
}

impl Serializer for ApplicationJson {
    fn serialize(&self, data: &Value) -> Result<SerializedBody> {
        let bytes = serde_json::to_vec(data).map_err(|e| ClientError::Codec(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(Self::MIME_TYPE));
        Ok(SerializedBody {
            content_type: Self::MIME_TYPE.to_string(),
            bytes,
            headers,
        })
    }
}

impl Deserializer for ApplicationJson {
    fn deserialize(&self, body: &[u8], _headers: &HeaderMap) -> Result<Value> {
        serde_json::from_slice(body).map_err(|e| ClientError::Codec(format!("invalid JSON body: {e}")))
    }
}
