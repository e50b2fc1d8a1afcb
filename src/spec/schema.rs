use super::document::Specification;
use super::path::NodePath;
use crate::error::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Composition keywords; a schema carrying any of them is treated as an object.
pub(crate) const COMPOSITION_KEYWORDS: [&str; 3] = ["allOf", "anyOf", "oneOf"];

/// How deep `allOf`/`anyOf`/`oneOf` members are searched for properties.
const MAX_COMPOSITION_DEPTH: usize = 8;

/// The resolved shape of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Object,
    Array,
    /// Any other declared type (`string`, `integer`, …)
    Scalar(String),
}

impl SchemaType {
    /// Determine the type of a schema node.
    ///
    /// Composition keywords win over `type`. For OpenAPI 3.1 type arrays the first entry that is
    /// not `null` is used.
    #[must_use]
    pub fn of(schema: &Value) -> Option<Self> {
        if COMPOSITION_KEYWORDS
            .iter()
            .any(|keyword| schema.get(keyword).is_some())
        {
            return Some(SchemaType::Object);
        }
        let declared = match schema.get("type")? {
            Value::String(name) => name.as_str(),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null")?,
            _ => return None,
        };
        Some(match declared {
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            other => SchemaType::Scalar(other.to_string()),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Scalar(name) => name,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema in the specification: node path, resolved type and the names of the models it is
/// nested in.
///
/// The namespace grows by one model name every time navigation descends into a property or an
/// array's items, so identically named nested schemas under different parents stay apart.
#[derive(Clone)]
pub struct Schema {
    spec: Arc<Specification>,
    node: NodePath,
    schema_type: Option<SchemaType>,
    namespace: Vec<String>,
}

impl Schema {
    /// Resolve the schema at `node`.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn new(spec: Arc<Specification>, node: NodePath, namespace: Vec<String>) -> Result<Self> {
        let schema_type = spec
            .resolve(&node)?
            .and_then(|resolved| SchemaType::of(resolved.value()));
        Ok(Self {
            spec,
            node,
            schema_type,
            namespace,
        })
    }

    #[must_use]
    pub fn node(&self) -> &NodePath {
        &self.node
    }

    #[must_use]
    pub fn schema_type(&self) -> Option<&SchemaType> {
        self.schema_type.as_ref()
    }

    #[must_use]
    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    #[must_use]
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    /// The schema's `title`, if declared.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn title(&self) -> Result<Option<String>> {
        self.spec.dig_str(&self.node.child("title"))
    }

    /// Schema of the items of an array schema, nested under `owner`.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn item_schema(&self, owner: &str) -> Result<Option<Schema>> {
        if self.schema_type != Some(SchemaType::Array) {
            return Ok(None);
        }
        let node = self.node.child("items");
        if self.spec.resolve(&node)?.is_none() {
            return Ok(None);
        }
        Schema::new(Arc::clone(&self.spec), node, self.nested(owner)).map(Some)
    }

    /// Schema of a declared property, nested under `owner`.
    ///
    /// Properties declared in `allOf`/`anyOf`/`oneOf` members are found as well.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn property_schema(&self, name: &str, owner: &str) -> Result<Option<Schema>> {
        match self.find_property(&self.node, name, 0)? {
            Some(node) => Schema::new(Arc::clone(&self.spec), node, self.nested(owner)).map(Some),
            None => Ok(None),
        }
    }

    /// Names of all declared properties, including those of composition members, in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// See [`Specification::resolve`].
    pub fn properties(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.collect_properties(&self.node, 0, &mut names)?;
        Ok(names)
    }

    fn nested(&self, owner: &str) -> Vec<String> {
        let mut namespace = self.namespace.clone();
        namespace.push(owner.to_string());
        namespace
    }

    fn find_property(&self, node: &NodePath, name: &str, depth: usize) -> Result<Option<NodePath>> {
        let property = node.join(["properties", name]);
        if self.spec.resolve(&property)?.is_some() {
            return Ok(Some(property));
        }
        if depth >= MAX_COMPOSITION_DEPTH {
            return Ok(None);
        }
        for member in self.composition_members(node)? {
            if let Some(found) = self.find_property(&member, name, depth + 1)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn collect_properties(&self, node: &NodePath, depth: usize, names: &mut Vec<String>) -> Result<()> {
        if let Some(properties) = self.spec.resolve(&node.child("properties"))? {
            if let Some(map) = properties.value().as_object() {
                for key in map.keys() {
                    if !names.contains(key) {
                        names.push(key.clone());
                    }
                }
            }
        }
        if depth >= MAX_COMPOSITION_DEPTH {
            return Ok(());
        }
        for member in self.composition_members(node)? {
            self.collect_properties(&member, depth + 1, names)?;
        }
        Ok(())
    }

    fn composition_members(&self, node: &NodePath) -> Result<Vec<NodePath>> {
        let mut members = Vec::new();
        for keyword in COMPOSITION_KEYWORDS {
            let list = node.child(keyword);
            let count = self
                .spec
                .resolve(&list)?
                .and_then(|resolved| resolved.value().as_array().map(Vec::len))
                .unwrap_or(0);
            members.extend((0..count).map(|index| list.child(index.to_string())));
        }
        Ok(members)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("node", &self.node)
            .field("schema_type", &self.schema_type)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
