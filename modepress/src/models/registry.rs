//! Model registry
//!
//! Reference items resolve their target collection through the registry,
//! so models never need to know about each other directly. The registry is
//! an ordinary value: applications create one at startup and tests create
//! as many isolated ones as they like.

use crate::config::OdmConfig;
use crate::database::Database;
use crate::error::{Error, ErrorContext, Result};
use crate::models::Model;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;

/// Registry mapping model names to live models
#[derive(Debug)]
pub struct ModelRegistry {
    models: DashMap<String, Arc<Model>>,
    config: OdmConfig,
}

impl ModelRegistry {
    /// Create an empty registry with the default configuration
    pub fn new() -> Arc<Self> {
        Self::with_config(OdmConfig::default())
    }

    pub fn with_config(config: OdmConfig) -> Arc<Self> {
        Arc::new(Self {
            models: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &OdmConfig {
        &self.config
    }

    /// Register a model under its name
    ///
    /// # Returns
    /// * `Ok(Arc<Model>)` - The shared handle now held by the registry
    /// * `Err(Error::Registry)` - If a model with that name already exists
    pub fn register(self: &Arc<Self>, model: Model) -> Result<Arc<Model>> {
        match self.models.entry(model.name().to_string()) {
            Entry::Occupied(entry) => Err(Error::Registry(format!(
                "A model named '{}' is already registered",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                model.attach(self);
                let model = Arc::new(model);
                entry.insert(model.clone());
                debug!("Registered model '{}'", model.name());
                Ok(model)
            }
        }
    }

    /// Get a model by name
    pub fn get(&self, name: &str) -> Result<Arc<Model>> {
        self.models
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::ModelNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Names of every registered model, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Bind every registered model to its collection in `database`
    ///
    /// Collection names are the model names with the configured prefix.
    /// Models that are already bound are left alone.
    pub async fn initialize(&self, database: &dyn Database) -> Result<()> {
        let models: Vec<Arc<Model>> = self.models.iter().map(|e| e.value().clone()).collect();

        for model in models {
            let collection_name = self.config.collection_name(model.name());
            let collection = database
                .collection(&collection_name)
                .await
                .with_context(|| format!("Could not open collection '{}'", collection_name))?;
            model.initialize(collection).await?;
        }

        info!(
            "Initialized {} models on database '{}'",
            self.models.len(),
            database.name()
        );
        Ok(())
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> RegistryStats {
        let model_names = self.names();
        let initialized_models = self
            .models
            .iter()
            .filter(|e| e.value().is_initialized())
            .count();

        RegistryStats {
            total_models: model_names.len(),
            initialized_models,
            model_names,
        }
    }
}

/// Statistics about the model registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Total number of registered models
    pub total_models: usize,
    /// Models bound to a collection
    pub initialized_models: usize,
    /// Sorted list of model names
    pub model_names: Vec<String>,
}
