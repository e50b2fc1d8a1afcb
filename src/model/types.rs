use crate::spec::{Schema, SchemaType};

/// A declared property of an object model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub schema_type: Option<SchemaType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelKind {
    /// An object with declared properties
    Object { properties: Vec<Property> },
    /// An array of items built against the item schema
    Collection,
}

/// A generated model type: the field-access descriptor shared by every instance built under
/// the same qualified name.
#[derive(Debug, Clone)]
pub struct ModelType {
    name: String,
    namespace: Vec<String>,
    kind: ModelKind,
    schema: Option<Schema>,
}

impl ModelType {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: Vec<String>, kind: ModelKind, schema: Option<Schema>) -> Self {
        Self {
            name: name.into(),
            namespace,
            kind,
            schema,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    /// `Library::Books::Book`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.name, &self.namespace)
    }

    #[must_use]
    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, ModelKind::Collection)
    }

    /// Declared properties; empty for collections.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        match &self.kind {
            ModelKind::Object { properties } => properties,
            ModelKind::Collection => &[],
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties().iter().find(|property| property.name == name)
    }

    /// The schema the type was generated from.
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }
}

/// Join a namespace and a name with `::`.
#[must_use]
pub fn qualified_name(name: &str, namespace: &[String]) -> String {
    namespace
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join("::")
}
