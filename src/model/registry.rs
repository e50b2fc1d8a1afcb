//! # Model Registry
//!
//! Maps a qualified model name (`Library::Books::Book`) to the [`ModelType`] generated for it.
//!
//! ## Thread Safety
//!
//! Every lookup and insertion goes through one `Mutex`. Type creation in
//! [`ModelRegistry::get_or_register`] happens while the lock is held, so concurrent responses
//! naming the same model always end up with the same `Arc<ModelType>`.
//!
//! Replacing a mapping with [`ModelRegistry::set`] or clearing the registry does not touch models
//! that were already built: they keep their own `Arc` to the previous type.
//!
//! ## Scope
//!
//! A registry is injected through the response context. [`ModelRegistry::global`] returns a
//! process-wide instance that [`Client`](crate::Client) falls back to when none is given.

use super::types::{qualified_name, ModelType};
use crate::error::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

static GLOBAL_REGISTRY: Lazy<Arc<ModelRegistry>> = Lazy::new(|| Arc::new(ModelRegistry::new()));

/// Cache from qualified model name to generated type.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Mutex<HashMap<String, Arc<ModelType>>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    #[must_use]
    pub fn global() -> Arc<ModelRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// The type registered under `name` in `namespace`.
    #[must_use]
    pub fn get(&self, name: &str, namespace: &[String]) -> Option<Arc<ModelType>> {
        let key = qualified_name(name, namespace);
        self.models
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .map(Arc::clone)
    }

    /// Register `model_type` under `name` in `namespace`, replacing any previous mapping.
    pub fn set(&self, name: &str, namespace: &[String], model_type: ModelType) -> Arc<ModelType> {
        let key = qualified_name(name, namespace);
        let model_type = Arc::new(model_type);
        debug!(model = %key, "Registered model type");
        self.models
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&model_type));
        model_type
    }

    /// Return the registered type, or build and register one under the same lock.
    ///
    /// `build` runs at most once per qualified name; when it fails nothing is registered.
    ///
    /// # Errors
    ///
    /// Whatever `build` returns.
    pub fn get_or_register<F>(&self, name: &str, namespace: &[String], build: F) -> Result<Arc<ModelType>>
    where
        F: FnOnce() -> Result<ModelType>,
    {
        let key = qualified_name(name, namespace);
        let mut models = self.models.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = models.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let model_type = Arc::new(build()?);
        debug!(model = %key, "Generated model type");
        models.insert(key, Arc::clone(&model_type));
        Ok(model_type)
    }

    /// Forget every registered type.
    pub fn reset(&self) {
        self.models
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered qualified names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .models
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
