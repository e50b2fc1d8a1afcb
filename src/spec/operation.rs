use super::document::Specification;
use super::path::NodePath;
use super::schema::Schema;
use crate::error::Result;
use http::Method;
use std::sync::Arc;
use tracing::debug;

/// Verbs an OpenAPI path item may declare, in the order they are scanned.
const METHODS: [(&str, Method); 8] = [
    ("get", Method::GET),
    ("put", Method::PUT),
    ("post", Method::POST),
    ("delete", Method::DELETE),
    ("options", Method::OPTIONS),
    ("head", Method::HEAD),
    ("patch", Method::PATCH),
    ("trace", Method::TRACE),
];

/// Reference to an operation in the specification.
///
/// Holds the verb, path template and the node path of the operation object
/// (`paths > /books/{id} > get`) rather than a copy of the operation itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub verb: Method,
    pub path: String,
    pub node: NodePath,
}

impl Operation {
    #[must_use]
    pub fn new(verb: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let verb_key = verb.as_str().to_ascii_lowercase();
        let node = NodePath::new(["paths", path.as_str(), verb_key.as_str()]);
        Self { verb, path, node }
    }
}

/// A response media type: node path, declared content type and the status code it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub node: NodePath,
    pub content_type: String,
    pub status: String,
}

impl Specification {
    /// Find the operation with the given `operationId`.
    ///
    /// Scans every `paths.*.{verb}` node in declaration order.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no operation carries the id.
    ///
    /// # Errors
    ///
    /// Propagates reference resolution failures, see [`Specification::resolve`].
    pub fn operation(&self, operation_id: &str) -> Result<Option<Operation>> {
        let Some(paths) = self.resolve(&NodePath::from(["paths"]))? else {
            return Ok(None);
        };
        let templates: Vec<String> = paths
            .value()
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();

        for template in templates {
            for (name, verb) in &METHODS {
                let node = NodePath::new(["paths", template.as_str(), *name]);
                let declared = self.dig_str(&node.child("operationId"))?;
                if declared.as_deref() == Some(operation_id) {
                    debug!(operation_id, verb = %verb, path = %template, "Resolved operation");
                    return Ok(Some(Operation {
                        verb: verb.clone(),
                        path: template,
                        node,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// All operation ids declared in the specification, in declaration order.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn operation_ids(&self) -> Result<Vec<String>> {
        let Some(paths) = self.resolve(&NodePath::from(["paths"]))? else {
            return Ok(Vec::new());
        };
        let templates: Vec<String> = paths
            .value()
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();

        let mut ids = Vec::new();
        for template in templates {
            for (name, _) in &METHODS {
                let node = NodePath::new(["paths", template.as_str(), *name, "operationId"]);
                if let Some(id) = self.dig_str(&node)? {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// Find the response media type for a status code.
    ///
    /// Looks at `responses.{status}.content` and falls back to `responses.default.content`.
    /// Without a requested `content_type` the first declared entry matches; otherwise the
    /// declared key must equal it exactly.
    ///
    /// # Arguments
    ///
    /// * `operation_node` - Node path of the operation
    /// * `status` - Response status code as written in the document (`"200"`)
    /// * `content_type` - Response content type without parameters
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the response or content type is not documented.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn media_type(
        &self,
        operation_node: &NodePath,
        status: &str,
        content_type: Option<&str>,
    ) -> Result<Option<MediaType>> {
        for code in [status, "default"] {
            let content = operation_node.join(["responses", code, "content"]);
            let Some(node) = self.resolve(&content)? else {
                continue;
            };
            let keys: Vec<String> = node
                .value()
                .as_object()
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default();
            let found = match content_type {
                None => keys.into_iter().next(),
                Some(wanted) => keys.into_iter().find(|key| key == wanted),
            };
            return Ok(found.map(|key| MediaType {
                node: content.child(key.as_str()),
                content_type: key,
                status: code.to_string(),
            }));
        }
        Ok(None)
    }

    /// Content types declared under the operation's `requestBody.content`, in declaration order.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn request_content_types(&self, operation_node: &NodePath) -> Result<Vec<String>> {
        let node = operation_node.join(["requestBody", "content"]);
        Ok(self
            .resolve(&node)?
            .and_then(|node| {
                node.value()
                    .as_object()
                    .map(|map| map.keys().cloned().collect())
            })
            .unwrap_or_default())
    }

    /// The schema declared for a media type, if any.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn schema(self: &Arc<Self>, media_type_node: &NodePath) -> Result<Option<Schema>> {
        let node = media_type_node.child("schema");
        match self.resolve(&node)? {
            Some(resolved) if resolved.value().is_object() => {
                Schema::new(Arc::clone(self), node, Vec::new()).map(Some)
            }
            _ => Ok(None),
        }
    }
}
