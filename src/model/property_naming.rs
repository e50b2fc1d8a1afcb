use heck::ToSnakeCase;
use std::collections::HashMap;

/// Maps a payload key to the name it is also reachable under on a [`Model`](super::Model).
pub trait PropertyNaming: Send + Sync {
    fn property_name(&self, key: &str) -> String;
}

/// snake_case normalisation with an exceptions table consulted first.
///
/// ```
/// use brrtclient::model::{PropertyNaming, SnakeCase};
///
/// let naming = SnakeCase::default().with_exception("1st-class", "first_class");
/// assert_eq!(naming.property_name("bookID"), "book_id");
/// assert_eq!(naming.property_name("1st-class"), "first_class");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnakeCase {
    exceptions: HashMap<String, String>,
}

impl SnakeCase {
    #[must_use]
    pub fn new(exceptions: HashMap<String, String>) -> Self {
        Self { exceptions }
    }

    /// Add one exception; later registrations replace earlier ones for the same key.
    #[must_use]
    pub fn with_exception(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.exceptions.insert(key.into(), name.into());
        self
    }

    #[must_use]
    pub fn exceptions(&self) -> &HashMap<String, String> {
        &self.exceptions
    }
}

impl PropertyNaming for SnakeCase {
    fn property_name(&self, key: &str) -> String {
        if let Some(name) = self.exceptions.get(key) {
            return name.clone();
        }
        let name = key.to_snake_case();
        if name.is_empty() {
            key.to_lowercase()
        } else {
            name
        }
    }
}
