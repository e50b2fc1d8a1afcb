use crate::content::{default_deserializers, Deserializer, Deserializers};
use crate::model::{ModelNaming, ModelRegistry, PropertyNaming, SnakeCase, SpecificationModelNaming};
use std::fmt;
use std::sync::Arc;

/// Everything needed to turn a response into objects.
///
/// Like [`RequestContext`](crate::request::RequestContext) this is a value: every `with_*`
/// method returns a modified copy.
#[derive(Clone)]
pub struct ResponseContext {
    deserializers: Deserializers,
    model_registry: Arc<ModelRegistry>,
    model_naming: Arc<dyn ModelNaming>,
    property_naming: Arc<dyn PropertyNaming>,
}

impl ResponseContext {
    /// Default deserializers and naming with the given registry.
    #[must_use]
    pub fn new(model_registry: Arc<ModelRegistry>) -> Self {
        Self {
            deserializers: default_deserializers(),
            model_registry,
            model_naming: Arc::new(SpecificationModelNaming),
            property_naming: Arc::new(SnakeCase::default()),
        }
    }

    #[must_use]
    pub fn deserializers(&self) -> &Deserializers {
        &self.deserializers
    }

    #[must_use]
    pub fn deserializer(&self, content_type: &str) -> Option<&Arc<dyn Deserializer>> {
        self.deserializers.get(content_type)
    }

    #[must_use]
    pub fn model_registry(&self) -> &Arc<ModelRegistry> {
        &self.model_registry
    }

    #[must_use]
    pub fn model_naming(&self) -> &dyn ModelNaming {
        self.model_naming.as_ref()
    }

    #[must_use]
    pub fn property_naming(&self) -> &dyn PropertyNaming {
        self.property_naming.as_ref()
    }

    #[must_use]
    pub fn with_deserializers(&self, deserializers: Deserializers) -> Self {
        Self {
            deserializers,
            ..self.clone()
        }
    }

    /// Register one more deserializer, replacing any for the same content type.
    #[must_use]
    pub fn with_deserializer(&self, content_type: impl Into<String>, deserializer: Arc<dyn Deserializer>) -> Self {
        let mut copy = self.clone();
        copy.deserializers.insert(content_type.into(), deserializer);
        copy
    }

    #[must_use]
    pub fn with_model_registry(&self, model_registry: Arc<ModelRegistry>) -> Self {
        Self {
            model_registry,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_model_naming(&self, model_naming: Arc<dyn ModelNaming>) -> Self {
        Self {
            model_naming,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_property_naming(&self, property_naming: Arc<dyn PropertyNaming>) -> Self {
        Self {
            property_naming,
            ..self.clone()
        }
    }
}

impl fmt::Debug for ResponseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut content_types: Vec<&String> = self.deserializers.keys().collect();
        content_types.sort();
        f.debug_struct("ResponseContext")
            .field("deserializers", &content_types)
            .field("models", &self.model_registry.len())
            .finish_non_exhaustive()
    }
}
