//! # Cache Module
//!
//! Validator-based HTTP caching on top of a byte [`Store`].
//!
//! ## Flow
//!
//! 1. Before the request, [`ConditionalRequest`] reads the validators remembered for the
//!    request path and turns them into `If-None-Match` / `If-Modified-Since` headers.
//! 2. After a `200` carrying an `ETag`, [`ConditionalResponse::remember`] stores the validators
//!    and the body.
//! 3. After a `304`, [`ConditionalResponse::retrieve`] returns the stored body so the response
//!    can be built as if the server had sent it again.
//!
//! ## Keys
//!
//! The request path (including the query string) is hashed with SHA-256 and split as
//! `xxxx/xxxx/rest` so a disk-backed store does not put every entry into one directory.
//! Validators live under `<fingerprint>.info` as JSON, the body under `<fingerprint>.data`.
//!
//! ## Concurrency
//!
//! Nothing here locks. Two requests for the same path racing on one store may interleave their
//! writes; callers that need otherwise have to serialize those requests.

mod conditional;
mod disk;

pub use conditional::{ConditionalRequest, ConditionalResponse, Validators};
pub use disk::DiskStore;

use sha2::{Digest, Sha256};
use std::io;

/// A persistent key → bytes store.
pub trait Store: Send + Sync {
    /// The value stored under `key`, `None` when there is none.
    ///
    /// # Errors
    ///
    /// I/O failures other than a missing entry.
    fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// # Errors
    ///
    /// I/O failures.
    fn write(&self, key: &str, value: &[u8]) -> io::Result<()>;

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// I/O failures.
    fn clear(&self) -> io::Result<()>;
}

/// Stable store key prefix for a request path: SHA-256 hex split as `xxxx/xxxx/rest`.
///
/// ```
/// let key = brrtclient::cache::fingerprint("/books/42");
/// assert_eq!(key.len(), 64 + 2);
/// assert_eq!(key.matches('/').count(), 2);
/// ```
#[must_use]
pub fn fingerprint(request_path: &str) -> String {
    let hex = format!("{:x}", Sha256::digest(request_path.as_bytes()));
    format!("{}/{}/{}", &hex[..4], &hex[4..8], &hex[8..])
}
