use super::{fingerprint, Store};
use crate::error::Result;
use crate::transport::HttpResponse;
use http::header::{HeaderName, HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Validators remembered for a request path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validators {
    #[serde(rename = "Etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "Last-Modified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl Validators {
    fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        Self {
            etag: text(ETAG),
            last_modified: text(LAST_MODIFIED),
        }
    }
}

fn info_key(fingerprint: &str) -> String {
    format!("{fingerprint}.info")
}

fn data_key(fingerprint: &str) -> String {
    format!("{fingerprint}.data")
}

/// Finds the headers for a conditional request.
pub struct ConditionalRequest<'a> {
    store: &'a dyn Store,
    fingerprint: String,
}

impl<'a> ConditionalRequest<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store, request_path: &str) -> Self {
        Self {
            store,
            fingerprint: fingerprint(request_path),
        }
    }

    /// Validators stored for the request path; empty when nothing was remembered.
    ///
    /// # Errors
    ///
    /// [`ClientError::Store`](crate::ClientError::Store) when the store fails to read.
    pub fn previous(&self) -> Result<Validators> {
        let Some(json) = self.store.read(&info_key(&self.fingerprint))? else {
            return Ok(Validators::default());
        };
        Ok(serde_json::from_slice(&json).unwrap_or_else(|e| {
            warn!(fingerprint = %self.fingerprint, error = %e, "Ignoring unreadable cache validators");
            Validators::default()
        }))
    }

    /// `If-None-Match` and `If-Modified-Since` for the remembered validators.
    ///
    /// # Errors
    ///
    /// See [`ConditionalRequest::previous`].
    pub fn headers(&self) -> Result<HeaderMap> {
        let previous = self.previous()?;
        let mut headers = HeaderMap::new();
        let pairs = [
            (IF_NONE_MATCH, previous.etag),
            (IF_MODIFIED_SINCE, previous.last_modified),
        ];
        for (name, value) in pairs {
            if let Some(value) = value.and_then(|value| HeaderValue::from_str(&value).ok()) {
                headers.insert(name, value);
            }
        }
        Ok(headers)
    }
}

/// Remembers and retrieves response bodies for a request path.
pub struct ConditionalResponse<'a> {
    store: &'a dyn Store,
    fingerprint: String,
}

impl<'a> ConditionalResponse<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store, request_path: &str) -> Self {
        Self {
            store,
            fingerprint: fingerprint(request_path),
        }
    }

    /// Store validators and body when the response carries an `ETag`.
    ///
    /// Returns whether anything was stored.
    ///
    /// # Errors
    ///
    /// [`ClientError::Store`](crate::ClientError::Store) when the store fails to write.
    pub fn remember(&self, response: &HttpResponse) -> Result<bool> {
        let validators = Validators::from_headers(&response.headers);
        if validators.etag.is_none() {
            return Ok(false);
        }
        let json = serde_json::to_vec(&validators).map_err(std::io::Error::other)?;
        self.store.write(&info_key(&self.fingerprint), &json)?;
        self.store.write(&data_key(&self.fingerprint), &response.body)?;
        debug!(fingerprint = %self.fingerprint, etag = ?validators.etag, "Remembered response");
        Ok(true)
    }

    /// The body remembered for the request path.
    ///
    /// # Errors
    ///
    /// [`ClientError::Store`](crate::ClientError::Store) when the store fails to read.
    pub fn retrieve(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.store.read(&data_key(&self.fingerprint))?)
    }
}
