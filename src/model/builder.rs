use super::object::{Collection, Model, Object};
use super::types::{ModelKind, ModelType, Property};
use crate::error::{ClientError, Result};
use crate::response::ResponseContext;
use crate::spec::{Schema, SchemaType};
use serde_json::Value;
use tracing::debug;

/// Suffix added to a collection's name when it equals its item's name.
const COLLECTION_SUFFIX: &str = "Collection";

/// Turns a payload plus its schema into an [`Object`].
///
/// Types are looked up in, or registered with, the context's model registry under the name the
/// context's model naming gives the schema, qualified by the schema's namespace.
#[derive(Debug, Clone, Copy)]
pub struct ObjectBuilder<'a> {
    context: &'a ResponseContext,
}

impl<'a> ObjectBuilder<'a> {
    #[must_use]
    pub fn new(context: &'a ResponseContext) -> Self {
        Self { context }
    }

    /// Build `payload` against `schema`.
    ///
    /// - `null` → [`Object::Null`]
    /// - object schema → a [`Model`] of the registered type
    /// - array schema → a [`Collection`] with every item built against the item schema
    /// - scalar schema → the raw value
    /// - schema without a type → a generic model for mappings, the raw value otherwise
    ///
    /// # Errors
    ///
    /// [`ClientError::TypeMismatch`] when the payload shape disagrees with the schema.
    pub fn build(&self, schema: &Schema, payload: &Value) -> Result<Object> {
        if payload.is_null() {
            return Ok(Object::Null);
        }
        match schema.schema_type() {
            Some(SchemaType::Object) => self.build_model(schema, payload),
            Some(SchemaType::Array) => self.build_collection(schema, payload),
            Some(SchemaType::Scalar(_)) => Ok(Object::Value(payload.clone())),
            None => Ok(self.build_untyped(payload)),
        }
    }

    /// Wrap a payload without schema information.
    ///
    /// Mappings become generic models so fields can still be read by name.
    #[must_use]
    pub fn build_untyped(&self, payload: &Value) -> Object {
        match payload {
            Value::Null => Object::Null,
            Value::Object(attributes) => {
                Object::Model(Model::new(None, attributes.clone(), self.context.clone()))
            }
            other => Object::Value(other.clone()),
        }
    }

    fn model_name(&self, schema: &Schema) -> Result<String> {
        self.context
            .model_naming()
            .model_name(schema.specification(), schema.node())
    }

    fn build_model(&self, schema: &Schema, payload: &Value) -> Result<Object> {
        let name = self.model_name(schema)?;
        let Value::Object(attributes) = payload else {
            return Err(ClientError::type_mismatch(name, "object", payload));
        };
        let model_type = self
            .context
            .model_registry()
            .get_or_register(&name, schema.namespace(), || object_type(&name, schema))?;
        Ok(Object::Model(Model::new(
            Some(model_type),
            attributes.clone(),
            self.context.clone(),
        )))
    }

    fn build_collection(&self, schema: &Schema, payload: &Value) -> Result<Object> {
        let name = self.collection_name(schema)?;
        let Value::Array(items) = payload else {
            return Err(ClientError::type_mismatch(name, "array", payload));
        };
        let model_type = self
            .context
            .model_registry()
            .get_or_register(&name, schema.namespace(), || {
                Ok(ModelType::new(
                    name.as_str(),
                    schema.namespace().to_vec(),
                    ModelKind::Collection,
                    Some(schema.clone()),
                ))
            })?;

        let item_schema = schema.item_schema(&name)?;
        let built = items
            .iter()
            .map(|item| match &item_schema {
                Some(item_schema) => self.build(item_schema, item),
                None => Ok(self.build_untyped(item)),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Object::Collection(Collection::new(model_type, built)))
    }

    /// The collection's own name, suffixed when it would collide with its item's name.
    fn collection_name(&self, schema: &Schema) -> Result<String> {
        let name = self.model_name(schema)?;
        let item_node = schema.node().child("items");
        let item_name = self
            .context
            .model_naming()
            .model_name(schema.specification(), &item_node)?;
        if item_name == name {
            return Ok(format!("{name}{COLLECTION_SUFFIX}"));
        }
        Ok(name)
    }
}

fn object_type(name: &str, schema: &Schema) -> Result<ModelType> {
    let properties = schema
        .properties()?
        .into_iter()
        .map(|property| {
            let schema_type = schema
                .property_schema(&property, name)?
                .and_then(|property_schema| property_schema.schema_type().cloned());
            Ok(Property {
                name: property,
                schema_type,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(
        model = name,
        properties = properties.len(),
        "Building model type from schema"
    );
    Ok(ModelType::new(
        name,
        schema.namespace().to_vec(),
        ModelKind::Object { properties },
        Some(schema.clone()),
    ))
}
