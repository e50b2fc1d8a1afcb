//! Structured logging setup
//!
//! The client logs through `tracing`. This module configures a `tracing-subscriber` stack from
//! environment variables, either process-wide with [`init_logging`] or as a standalone
//! [`Dispatch`] that can be handed to a single request chain with
//! [`Context::with_logger`](crate::Context::with_logger).
//!
//! | Variable | Default | Values |
//! |---|---|---|
//! | `BRRTC_LOG_LEVEL` | `info` | `trace` `debug` `info` `warn` `error` |
//! | `BRRTC_LOG_FORMAT` | `json` | `json` `pretty` |
//! | `BRRTC_LOG_TARGETS` | | comma-separated `EnvFilter` directives |
//! | `BRRTC_LOG_REDACT_LEVEL` | `credentials` | `none` `credentials` |
//!
//! Request headers are logged at debug level. Unless redaction is `none`, credential-bearing
//! header values are replaced with `<REDACTED>`.

use anyhow::{Context, Result};
use http::HeaderMap;
use std::env;
use tracing::{Dispatch, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const REDACTED: &str = "<REDACTED>";

/// Header names whose values are always redacted.
const CREDENTIAL_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

/// Fragments that mark a header name as credential-bearing.
const CREDENTIAL_FRAGMENTS: [&str; 2] = ["api-key", "token"];

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Redaction level for logged request headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedactionLevel {
    /// No redaction (dev only)
    None,
    /// Redact credential-bearing headers
    #[default]
    Credentials,
}

impl RedactionLevel {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => RedactionLevel::None,
            _ => RedactionLevel::Credentials,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Redaction level: none/credentials
    pub redact_level: RedactionLevel,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            redact_level: RedactionLevel::Credentials,
            target_filter: None,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("BRRTC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("BRRTC_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            redact_level: RedactionLevel::parse(
                &env::var("BRRTC_LOG_REDACT_LEVEL").unwrap_or_else(|_| "credentials".to_string()),
            ),
            target_filter: env::var("BRRTC_LOG_TARGETS").ok(),
        }
    }

    /// Debug-level pretty output without redaction, for local development
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            redact_level: RedactionLevel::None,
            target_filter: None,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let level = match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        let mut env_filter = EnvFilter::new(level.as_str());

        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',') {
                let filter = filter.trim();
                if filter.is_empty() {
                    continue;
                }
                match filter.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {}", filter),
                }
            }
        }
        env_filter
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        match self.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(false)
                .boxed(),
        }
    }

    /// A dispatcher for this configuration, not installed anywhere.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use brrtclient::logging::LogConfig;
    ///
    /// let logger = LogConfig::default_dev().dispatch();
    /// ```
    #[must_use]
    pub fn dispatch(&self) -> Dispatch {
        let subscriber = tracing_subscriber::registry()
            .with(self.env_filter())
            .with(self.fmt_layer());
        Dispatch::new(subscriber)
    }
}

/// Install the configured subscriber as the process-wide default.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use brrtclient::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::from_env()).expect("Failed to initialize logging");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(config.fmt_layer())
        .try_init()
        .context("Failed to initialize logging")
}

/// `true` when values of the header should not appear in logs.
#[must_use]
pub fn is_credential_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    CREDENTIAL_HEADERS.contains(&name.as_str())
        || CREDENTIAL_FRAGMENTS
            .iter()
            .any(|fragment| name.contains(fragment))
}

/// Header name/value pairs ready for logging.
#[must_use]
pub fn redact_headers(headers: &HeaderMap, level: RedactionLevel) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if level == RedactionLevel::Credentials && is_credential_header(name.as_str()) {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
