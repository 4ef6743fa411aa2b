//! Application state management

use std::collections::HashMap;
use std::sync::Arc;

use crate::inference::{ModelLoader, Predictor};
use crate::schema::{ModelPage, SchemaRegistry};

use super::error::{Result, ServerError};
use super::ServerConfig;

/// Outcome of loading one page's model at startup
#[derive(Clone)]
pub enum ModelSlot {
    Ready(Arc<dyn Predictor>),
    Unavailable(String),
}

impl std::fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSlot::Ready(p) => f.debug_tuple("Ready").field(&p.task()).finish(),
            ModelSlot::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

impl ModelSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelSlot::Ready(_))
    }
}

/// Application state shared across handlers
///
/// Built once before the router starts and never mutated afterwards, so
/// handlers share it without locking.
pub struct AppState {
    pub config: ServerConfig,
    registry: SchemaRegistry,
    models: HashMap<String, ModelSlot>,
}

impl AppState {
    /// Load every page's artifact from `config.models_dir`
    pub fn load(config: ServerConfig, registry: SchemaRegistry) -> Self {
        let loader = ModelLoader::new(&config.models_dir);
        let models = loader
            .load_all(&registry)
            .into_iter()
            .map(|(id, loaded)| {
                let slot = match loaded {
                    Ok(predictor) => ModelSlot::Ready(predictor),
                    Err(e) => ModelSlot::Unavailable(e.to_string()),
                };
                (id, slot)
            })
            .collect();

        Self {
            config,
            registry,
            models,
        }
    }

    /// Use already-loaded predictors; pages without one are unavailable
    pub fn with_predictors(
        config: ServerConfig,
        registry: SchemaRegistry,
        mut predictors: HashMap<String, Arc<dyn Predictor>>,
    ) -> Self {
        let models = registry
            .ids()
            .map(|id| {
                let slot = match predictors.remove(id) {
                    Some(p) => ModelSlot::Ready(p),
                    None => ModelSlot::Unavailable(format!("no model loaded for '{}'", id)),
                };
                (id.to_string(), slot)
            })
            .collect();

        Self {
            config,
            registry,
            models,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn slot(&self, id: &str) -> Option<&ModelSlot> {
        self.models.get(id)
    }

    pub fn available_count(&self) -> usize {
        self.models.values().filter(|s| s.is_ready()).count()
    }

    /// Resolve a page and its predictor, or explain why it cannot serve
    pub fn page(&self, id: &str) -> Result<(&ModelPage, Arc<dyn Predictor>)> {
        let page = self
            .registry
            .page(id)
            .map_err(|_| ServerError::NotFound(format!("Unknown model: {}", id)))?;

        match self.models.get(id) {
            Some(ModelSlot::Ready(predictor)) => Ok((page, Arc::clone(predictor))),
            Some(ModelSlot::Unavailable(reason)) => Err(ServerError::Unavailable(reason.clone())),
            None => Err(ServerError::Unavailable(format!("no model loaded for '{}'", id))),
        }
    }
}
