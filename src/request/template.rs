//! Path template expansion and query string building.

use crate::error::{ClientError, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// `{name}` variables in a path template (RFC 6570 level 1).
static VARIABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("template variable regex should be valid"));

/// Expand `{name}` variables in `template`, percent-encoding every value.
///
/// # Errors
///
/// [`ClientError::Parameter`] when a variable has no bound value.
pub fn expand(template: &str, params: Option<&Map<String, Value>>) -> Result<String> {
    let mut unbound = Vec::new();
    let expanded = VARIABLE_REGEX.replace_all(template, |captures: &Captures<'_>| {
        let name = &captures[1];
        match params.and_then(|params| params.get(name)) {
            Some(value) => urlencoding::encode(&scalar_text(value)).into_owned(),
            None => {
                unbound.push(name.to_string());
                String::new()
            }
        }
    });
    if !unbound.is_empty() {
        return Err(ClientError::Parameter(format!(
            "no value for {} in path template {template}",
            unbound.join(", ")
        )));
    }
    Ok(expanded.into_owned())
}

/// Build a percent-encoded query string.
///
/// Sequences repeat the key for each element; `null` emits the bare key; mappings are sent as
/// compact JSON.
#[must_use]
pub fn build_query(params: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        match value {
            Value::Null => {
                serializer.append_key_only(name);
            }
            Value::Array(values) => {
                for value in values {
                    serializer.append_pair(name, &scalar_text(value));
                }
            }
            other => {
                serializer.append_pair(name, &scalar_text(other));
            }
        }
    }
    serializer.finish()
}

/// Text form of a parameter value: strings unquoted, everything else as JSON.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
