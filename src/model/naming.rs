//! Model naming strategies.
//!
//! A model name is derived from a schema's position in the specification. Names decide type
//! identity in the [`ModelRegistry`](super::ModelRegistry), so every strategy has to be
//! deterministic for a given node.

use crate::error::Result;
use crate::spec::{NodePath, Specification};
use std::borrow::Cow;

/// Extensions stripped from the last segment of a `$ref` to an external file.
const SPEC_FILE_EXTENSIONS: [&str; 3] = [".yml", ".yaml", ".json"];

/// Derives a model name for the schema at a node path.
pub trait ModelNaming: Send + Sync {
    /// # Errors
    ///
    /// Propagates reference resolution failures.
    fn model_name(&self, spec: &Specification, node: &NodePath) -> Result<String>;
}

/// Default strategy: schema `title`, then the `$ref` that reached the schema, then the node's
/// position in the document.
///
/// | Source | Example | Name |
/// |---|---|---|
/// | `title: ' A %2F root with 🚕 in the '` | | `AFRootWithInThe` |
/// | `$ref: '#/components/schemas/Library'` | | `Library` |
/// | `$ref: './schemas/author.yml'` | | `Author` |
/// | position | `paths > /national_industries > get > … > schema` | `NationalIndustrie` |
/// | position | `… > properties > birds > items` | `Bird` |
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecificationModelNaming;

impl ModelNaming for SpecificationModelNaming {
    fn model_name(&self, spec: &Specification, node: &NodePath) -> Result<String> {
        if let Some(title) = spec.dig_str(&node.child("title"))? {
            let name = title_model_name(&title);
            if !name.is_empty() {
                return Ok(name);
            }
        }
        if let Some(reference) = spec.reference(node)? {
            let name = ref_model_name(&reference);
            if !name.is_empty() {
                return Ok(name);
            }
        }
        let position = node_path_name(node);
        let name = title_model_name(&capitalize(&position).replace(['_', '-'], " "));
        if name.is_empty() {
            return Ok("Model".to_string());
        }
        Ok(name)
    }
}

/// Names models after the operation that returns them.
///
/// `<OperationId>Response` for the response schema, the capitalised property name for
/// properties, and `<Property>Item` or `<OperationId>Item` for array items.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationModelNaming;

impl ModelNaming for OperationModelNaming {
    fn model_name(&self, spec: &Specification, node: &NodePath) -> Result<String> {
        if node.last() == Some("items") {
            if node.from_end(2) == Some("properties") {
                let owner = node.from_end(1).unwrap_or_default();
                return Ok(format!("{}Item", capitalize(owner)));
            }
            return Ok(format!("{}Item", operation_model_name(spec, node)?));
        }
        if node.from_end(1) == Some("properties") {
            return Ok(capitalize(node.last().unwrap_or_default()));
        }
        Ok(format!("{}Response", operation_model_name(spec, node)?))
    }
}

/// Uses the node path itself, joined with the ASCII record separator.
///
/// Names are unique per schema position but not meant for display.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeModelNaming;

impl ModelNaming for NodeModelNaming {
    fn model_name(&self, _spec: &Specification, node: &NodePath) -> Result<String> {
        Ok(node.segments().join("\u{1e}"))
    }
}

/// Camel-case a free-form title.
///
/// Every run of non-alphabetic characters is dropped and the letter following it upper-cased;
/// all other letters keep their case.
#[must_use]
pub fn title_model_name(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    let mut boundary = false;
    for c in title.chars() {
        if c.is_alphabetic() {
            if boundary {
                name.extend(c.to_uppercase());
            } else {
                name.push(c);
            }
            boundary = false;
        } else {
            boundary = true;
        }
    }
    name
}

/// Model name from the last segment of a `$ref`.
///
/// The segment is percent-decoded and loses a trailing spec file extension before being
/// camel-cased with an upper-case first letter.
///
/// ```
/// use brrtclient::model::ref_model_name;
///
/// assert_eq!(ref_model_name("#/components/schemas/Library"), "Library");
/// assert_eq!(ref_model_name("./schemas/%20howdy%E2%9A%A0%EF%B8%8F.Pardner"), "HowdyPardner");
/// ```
#[must_use]
pub fn ref_model_name(reference: &str) -> String {
    let segment = reference.rsplit('/').next().unwrap_or(reference);
    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
    let stem = SPEC_FILE_EXTENSIONS
        .iter()
        .find_map(|extension| decoded.strip_suffix(extension))
        .unwrap_or(&*decoded);
    upper_first(&title_model_name(stem))
}

/// Position-derived name before camel-casing.
fn node_path_name(node: &NodePath) -> String {
    if node.last() == Some("schema") || node.ends_with(&["schema", "items"]) {
        return request_path_model_name(node);
    }
    if node.last() == Some("items") {
        return singularize(node.from_end(1).unwrap_or_default()).to_string();
    }
    node.last().unwrap_or_default().to_string()
}

/// Last segment of the request path that is not a `{parameter}`, singularized.
///
/// `paths > /books/{id} > …` → `book`
fn request_path_model_name(node: &NodePath) -> String {
    node.get(1)
        .and_then(|path| {
            path.split('/')
                .rev()
                .find(|part| !part.is_empty() && !part.starts_with('{'))
        })
        .map(|part| singularize(part).to_string())
        .unwrap_or_default()
}

fn singularize(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// First letter upper-case, the rest lower-case.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn operation_model_name(spec: &Specification, node: &NodePath) -> Result<String> {
    let operation_id = match node.position("responses") {
        Some(index) => spec.dig_str(&node.truncate(index).child("operationId"))?,
        None => None,
    };
    let operation_id = operation_id.unwrap_or_else(|| node.last().unwrap_or_default().to_string());
    Ok(upper_first(&operation_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> Specification {
        Specification::from_value(
            json!({
                "paths": {
                    "/national_industries": {
                        "get": {
                            "operationId": "listIndustries",
                            "responses": {
                                "200": {"content": {"application/json": {"schema": {
                                    "type": "array",
                                    "items": {"type": "object"}
                                }}}}
                            }
                        }
                    },
                    "/books/{id}": {
                        "get": {
                            "operationId": "fetchBook",
                            "responses": {
                                "200": {"content": {"application/json": {"schema": {
                                    "$ref": "#/components/schemas/Book"
                                }}}}
                            }
                        }
                    },
                    "/titled": {
                        "get": {
                            "responses": {
                                "200": {"content": {"application/json": {"schema": {
                                    "title": " A %2F root with 🚕 in the ",
                                    "type": "object",
                                    "properties": {
                                        "birds": {"type": "array", "items": {"type": "object"}},
                                        "first_name": {"type": "string"}
                                    }
                                }}}}
                            }
                        }
                    }
                },
                "components": {
                    "schemas": {
                        "Book": {"type": "object"},
                        "Isbn": {"title": "ISBN", "type": "string"}
                    }
                }
            }),
            "/nonexistent/openapi.yml",
        )
    }

    fn response_schema(path: &str) -> NodePath {
        NodePath::new([
            "paths",
            path,
            "get",
            "responses",
            "200",
            "content",
            "application/json",
            "schema",
        ])
    }

    #[test]
    fn test_title_model_name() {
        assert_eq!(title_model_name(" A %2F root with 🚕 in the "), "AFRootWithInThe");
        assert_eq!(title_model_name("ISBN"), "ISBN");
        assert_eq!(title_model_name("library"), "library");
    }

    #[test]
    fn test_ref_model_name() {
        assert_eq!(ref_model_name("#/components/schemas/Library"), "Library");
        assert_eq!(ref_model_name("%20howdy%E2%9A%A0%EF%B8%8F.Pardner"), "HowdyPardner");
        assert_eq!(ref_model_name("Service.Subscription"), "ServiceSubscription");
        assert_eq!(ref_model_name("./schemas/author.yml"), "Author");
        assert_eq!(ref_model_name("./schemas/national-author.json"), "NationalAuthor");
    }

    #[test]
    fn test_specification_naming_prefers_title() {
        let spec = spec();
        let name = SpecificationModelNaming
            .model_name(&spec, &response_schema("/titled"))
            .unwrap();
        assert_eq!(name, "AFRootWithInThe");
        let isbn = NodePath::from(["components", "schemas", "Isbn"]);
        assert_eq!(SpecificationModelNaming.model_name(&spec, &isbn).unwrap(), "ISBN");
    }

    #[test]
    fn test_specification_naming_uses_ref() {
        let name = SpecificationModelNaming
            .model_name(&spec(), &response_schema("/books/{id}"))
            .unwrap();
        assert_eq!(name, "Book");
    }

    #[test]
    fn test_specification_naming_uses_request_path() {
        let spec = spec();
        let schema = response_schema("/national_industries");
        assert_eq!(
            SpecificationModelNaming.model_name(&spec, &schema).unwrap(),
            "NationalIndustrie"
        );
        assert_eq!(
            SpecificationModelNaming
                .model_name(&spec, &schema.child("items"))
                .unwrap(),
            "NationalIndustrie"
        );
    }

    #[test]
    fn test_specification_naming_uses_property_names() {
        let spec = spec();
        let properties = response_schema("/titled").child("properties");
        assert_eq!(
            SpecificationModelNaming
                .model_name(&spec, &properties.join(["birds", "items"]))
                .unwrap(),
            "Bird"
        );
        assert_eq!(
            SpecificationModelNaming
                .model_name(&spec, &properties.child("first_name"))
                .unwrap(),
            "FirstName"
        );
    }

    #[test]
    fn test_operation_naming() {
        let spec = spec();
        let schema = response_schema("/national_industries");
        assert_eq!(
            OperationModelNaming.model_name(&spec, &schema).unwrap(),
            "ListIndustriesResponse"
        );
        assert_eq!(
            OperationModelNaming.model_name(&spec, &schema.child("items")).unwrap(),
            "ListIndustriesItem"
        );
        let birds = schema.join(["properties", "birds"]);
        assert_eq!(OperationModelNaming.model_name(&spec, &birds).unwrap(), "Birds");
        assert_eq!(
            OperationModelNaming.model_name(&spec, &birds.child("items")).unwrap(),
            "BirdsItem"
        );
    }

    #[test]
    fn test_node_naming() {
        let node = NodePath::from(["components", "schemas", "Book"]);
        assert_eq!(
            NodeModelNaming.model_name(&spec(), &node).unwrap(),
            "components\u{1e}schemas\u{1e}Book"
        );
    }
}
