//! # Client Configuration Module
//!
//! Environment variable-based configuration for a [`Client`](crate::Client).
//!
//! ## Environment Variables
//!
//! ### `BRRTC_BASE_URL`
//!
//! Base URL for every request. Overrides the first entry of the specification's `servers`.
//!
//! ### `BRRTC_USER_AGENT`
//!
//! Value of the `User-Agent` header. Default: `brrtclient/<crate version>`.
//!
//! ### `BRRTC_CACHE_DIR`
//!
//! When set, conditional requests are enabled and validators plus bodies are kept in a
//! [`DiskStore`](crate::cache::DiskStore) rooted at this directory.
//!
//! ### `BRRTC_TIMEOUT_MS`
//!
//! Request timeout of the default transport in milliseconds (decimal or `0x` hex). Unset or
//! unparsable means no timeout.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use brrtclient::config::ClientConfig;
//! use brrtclient::Client;
//!
//! let client = Client::from_config("openapi.yml", ClientConfig::from_env())?;
//! # Ok::<(), brrtclient::ClientError>(())
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("brrtclient/", env!("CARGO_PKG_VERSION"));

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL override (default: the specification's first server)
    pub base_url: Option<String>,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Directory for the conditional request cache (default: disabled)
    pub cache_dir: Option<PathBuf>,
    /// Transport timeout (default: none)
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_dir: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Empty values count as unset.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            base_url: var("BRRTC_BASE_URL"),
            user_agent: var("BRRTC_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            cache_dir: var("BRRTC_CACHE_DIR").map(PathBuf::from),
            timeout: var("BRRTC_TIMEOUT_MS")
                .and_then(|value| parse_millis(&value))
                .map(Duration::from_millis),
        }
    }
}

fn parse_millis(value: &str) -> Option<u64> {
    let value = value.trim();
    match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
