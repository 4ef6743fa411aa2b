//! Model artifact loading

use super::{LinearArtifact, Predictor};
use crate::error::{HubError, Result};
use crate::schema::{ModelPage, SchemaRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Resolves `<models_dir>/<artifact>.json` for each page and loads it
#[derive(Debug, Clone)]
pub struct ModelLoader {
    models_dir: PathBuf,
}

impl ModelLoader {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn artifact_path(&self, page: &ModelPage) -> PathBuf {
        self.models_dir.join(format!("{}.json", page.artifact))
    }

    /// Load the artifact bound to `page`.
    ///
    /// A missing, corrupt or mismatched artifact is a configuration error; it
    /// is reported once and never retried.
    pub fn load(&self, page: &ModelPage) -> Result<Arc<dyn Predictor>> {
        let path = self.artifact_path(page);
        let artifact = LinearArtifact::load(&path).map_err(|e| {
            HubError::Configuration(format!(
                "failed to load model '{}' from {}: {}",
                page.id,
                path.display(),
                e
            ))
        })?;

        if artifact.task != page.task {
            return Err(HubError::Configuration(format!(
                "model '{}' is a {} artifact but the page expects {}",
                page.id, artifact.task, page.task
            )));
        }
        artifact.check_schema(&page.schema)?;

        info!(
            model = %page.id,
            path = %path.display(),
            task = %page.task,
            classes = artifact.scorers.len(),
            "Model loaded"
        );
        Ok(Arc::new(artifact))
    }

    /// Load every registered page, keeping failures per page
    pub fn load_all(&self, registry: &SchemaRegistry) -> Vec<(String, Result<Arc<dyn Predictor>>)> {
        registry
            .pages()
            .iter()
            .map(|page| {
                let loaded = self.load(page);
                if let Err(ref e) = loaded {
                    warn!(model = %page.id, error = %e, "Model unavailable");
                }
                (page.id.clone(), loaded)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::LinearScorer;
    use crate::schema::{TaskKind, USED_CAR, WHEAT_SEEDS};
    use std::collections::BTreeMap;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builtin().unwrap()
    }

    #[test]
    fn test_artifact_path() {
        let registry = registry();
        let loader = ModelLoader::new("/srv/models");
        let page = registry.page(USED_CAR).unwrap();
        assert_eq!(
            loader.artifact_path(page),
            PathBuf::from("/srv/models/usedcar_price_model.json")
        );
    }

    #[test]
    fn test_missing_artifact_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        let loader = ModelLoader::new(dir.path());
        let err = loader.load(registry.page(WHEAT_SEEDS).unwrap()).err().unwrap();
        assert!(matches!(err, HubError::Configuration(_)));
    }

    #[test]
    fn test_task_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        let page = registry.page(WHEAT_SEEDS).unwrap();
        let loader = ModelLoader::new(dir.path());
        LinearArtifact::regression(LinearScorer::default())
            .save(&loader.artifact_path(page))
            .unwrap();

        let err = loader.load(page).err().unwrap();
        assert!(err.to_string().contains("regression"));
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        let page = registry.page(USED_CAR).unwrap();
        let loader = ModelLoader::new(dir.path());
        let scorer = LinearScorer {
            weights: BTreeMap::from([("Price".to_string(), 1.0)]),
            ..Default::default()
        };
        LinearArtifact::regression(scorer)
            .save(&loader.artifact_path(page))
            .unwrap();

        assert!(loader.load(page).is_err());
    }

    #[test]
    fn test_load_all_keeps_failures_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        let loader = ModelLoader::new(dir.path());
        let page = registry.page(USED_CAR).unwrap();
        LinearArtifact::regression(LinearScorer::default())
            .save(&loader.artifact_path(page))
            .unwrap();

        let loaded = loader.load_all(&registry);
        assert_eq!(loaded.len(), 3);
        for (id, result) in loaded {
            assert_eq!(result.is_ok(), id == USED_CAR, "unexpected outcome for {}", id);
            if let Ok(predictor) = result {
                assert_eq!(predictor.task(), TaskKind::Regression);
            }
        }
    }
}
