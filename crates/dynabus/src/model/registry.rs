// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Registry of known models, keyed by model number.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::model::{xl430, xm430, Model};

/// Model number to [`Model`] lookup.
///
/// Built explicitly and handed to the controller, so tests can register
/// their own models without touching any shared state.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<u16, Arc<Model>>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in model.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        registry.register(xm430::model()?);
        registry.register(xl430::model()?);
        Ok(registry)
    }

    /// Registers a model, replacing and returning any model with the same number.
    pub fn register(&mut self, model: Model) -> Option<Arc<Model>> {
        self.models.insert(model.model_number(), Arc::new(model))
    }

    /// Looks up a model number.
    pub fn detect(&self, model_number: u16) -> Option<Arc<Model>> {
        self.models.get(&model_number).cloned()
    }

    /// Returns `true` if `model_number` is registered.
    pub fn contains(&self, model_number: u16) -> bool {
        self.models.contains_key(&model_number)
    }

    /// Registered models, ordered by model number.
    pub fn models(&self) -> Vec<Arc<Model>> {
        let mut models: Vec<_> = self.models.values().cloned().collect();
        models.sort_by_key(|model| model.model_number());
        models
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
