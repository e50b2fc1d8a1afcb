use super::builder::ObjectBuilder;
use super::types::ModelType;
use crate::error::{ClientError, Result};
use crate::response::ResponseContext;
use crate::spec::SchemaType;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A built response value.
#[derive(Debug, Clone)]
pub enum Object {
    /// Absent or `null` payload
    Null,
    /// Scalar, or a value without schema information
    Value(Value),
    Model(Model),
    Collection(Collection),
}

impl Object {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Object::Model(model) => Some(model),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Object::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Object::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// The payload this object was built from.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Object::Null => Value::Null,
            Object::Value(value) => value.clone(),
            Object::Model(model) => Value::Object(model.attributes().clone()),
            Object::Collection(collection) => {
                Value::Array(collection.iter().map(Object::to_value).collect())
            }
        }
    }
}

/// An object-shaped payload with schema-derived accessors.
///
/// Every payload key is reachable under its original name and under the name produced by the
/// context's property naming (`firstName` and `first_name`). Declared object and array
/// properties are built on first access and memoized; everything else is returned as is.
///
/// Cloning is cheap and clones share memoized values.
#[derive(Clone)]
pub struct Model(Arc<ModelInner>);

struct ModelInner {
    model_type: Option<Arc<ModelType>>,
    attributes: Map<String, Value>,
    aliases: HashMap<String, String>,
    context: ResponseContext,
    built: HashMap<String, OnceCell<Object>>,
}

impl Model {
    /// Wrap `attributes` in an instance of `model_type`.
    ///
    /// Without a type the model is generic: every key is readable but nothing is built.
    #[must_use]
    pub fn new(
        model_type: Option<Arc<ModelType>>,
        attributes: Map<String, Value>,
        context: ResponseContext,
    ) -> Self {
        let naming = context.property_naming();
        let mut aliases = HashMap::new();
        for key in attributes.keys() {
            let alias = naming.property_name(key);
            if alias != *key && !attributes.contains_key(&alias) {
                aliases.entry(alias).or_insert_with(|| key.clone());
            }
        }

        let built = model_type
            .as_ref()
            .map(|model_type| {
                model_type
                    .properties()
                    .iter()
                    .filter(|property| {
                        matches!(
                            property.schema_type,
                            Some(SchemaType::Object | SchemaType::Array)
                        )
                    })
                    .filter(|property| attributes.contains_key(&property.name))
                    .map(|property| (property.name.clone(), OnceCell::new()))
                    .collect()
            })
            .unwrap_or_default();

        Self(Arc::new(ModelInner {
            model_type,
            attributes,
            aliases,
            context,
            built,
        }))
    }

    /// Read an attribute by original or normalised name.
    ///
    /// # Errors
    ///
    /// [`ClientError::Attribute`] when the payload has no such key. A key that is present with a
    /// `null` value returns [`Object::Null`].
    pub fn get(&self, name: &str) -> Result<Object> {
        self.try_get(name)?.ok_or_else(|| ClientError::Attribute {
            model: self.model_name().unwrap_or("Model").to_string(),
            name: name.to_string(),
        })
    }

    /// Like [`Model::get`] but absent keys are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Building a nested object can fail with [`ClientError::TypeMismatch`].
    pub fn try_get(&self, name: &str) -> Result<Option<Object>> {
        let Some(key) = self.key_for(name) else {
            return Ok(None);
        };
        let Some(value) = self.0.attributes.get(key) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(Some(Object::Null));
        }
        match self.0.built.get(key) {
            Some(cell) => cell
                .get_or_try_init(|| self.build_property(key, value))
                .cloned()
                .map(Some),
            None => Ok(Some(Object::Value(value.clone()))),
        }
    }

    /// The raw payload value under an original key.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.attributes.get(key)
    }

    /// `true` when the payload has the key, under either name. `null` values count as present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.key_for(name).is_some()
    }

    /// Original payload keys in payload order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.attributes.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.attributes.is_empty()
    }

    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0.attributes
    }

    /// Name of the generated type, `None` for generic models.
    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        self.0.model_type.as_deref().map(ModelType::name)
    }

    #[must_use]
    pub fn model_type(&self) -> Option<&Arc<ModelType>> {
        self.0.model_type.as_ref()
    }

    fn key_for(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.0.attributes.get_key_value(name) {
            return Some(key.as_str());
        }
        self.0.aliases.get(name).map(String::as_str)
    }

    fn build_property(&self, key: &str, value: &Value) -> Result<Object> {
        let Some(model_type) = self.0.model_type.as_ref() else {
            return Ok(Object::Value(value.clone()));
        };
        let Some(schema) = model_type.schema() else {
            return Ok(Object::Value(value.clone()));
        };
        match schema.property_schema(key, model_type.name())? {
            Some(property_schema) => ObjectBuilder::new(&self.0.context).build(&property_schema, value),
            None => Ok(Object::Value(value.clone())),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("model_name", &self.model_name())
            .field("attributes", &self.0.attributes)
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of built items.
#[derive(Clone)]
pub struct Collection(Arc<CollectionInner>);

struct CollectionInner {
    model_type: Arc<ModelType>,
    items: Vec<Object>,
}

impl Collection {
    #[must_use]
    pub fn new(model_type: Arc<ModelType>, items: Vec<Object>) -> Self {
        Self(Arc::new(CollectionInner { model_type, items }))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Object> {
        self.0.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.0.items.iter()
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        self.0.model_type.name()
    }

    #[must_use]
    pub fn model_type(&self) -> &Arc<ModelType> {
        &self.0.model_type
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("model_name", &self.model_name())
            .field("items", &self.0.items)
            .finish()
    }
}
