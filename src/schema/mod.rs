//! Feature schemas and the model page registry
//!
//! Each model page is bound to one pre-trained artifact and one fixed
//! [`FeatureSchema`]: the ordered input columns the model was trained on, each
//! flagged numeric or categorical, with the example value a form shows first.

mod builtin;

pub use builtin::{MELBOURNE_HOUSING, USED_CAR, WHEAT_SEEDS};

use crate::coercion::RawInput;
use crate::error::{HubError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a feature is typed on its way into the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// Example value used to pre-populate an input form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Number(f64),
    Text(String),
}

impl DefaultValue {
    /// Render the value the way a text control would show it (`15.26`, `2015`, `Petrol`)
    pub fn to_input_string(&self) -> String {
        match self {
            DefaultValue::Number(v) => v.to_string(),
            DefaultValue::Text(s) => s.clone(),
        }
    }

    fn matches(&self, kind: FeatureKind) -> bool {
        matches!(
            (self, kind),
            (DefaultValue::Number(_), FeatureKind::Numeric)
                | (DefaultValue::Text(_), FeatureKind::Categorical)
        )
    }
}

/// A single model input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub kind: FeatureKind,
    pub default: DefaultValue,
}

impl Feature {
    pub fn numeric(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric,
            default: DefaultValue::Number(default),
        }
    }

    pub fn categorical(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical,
            default: DefaultValue::Text(default.into()),
        }
    }
}

/// Ordered, immutable description of the columns a model expects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSchema {
    features: Vec<Feature>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty schemas, duplicate names and defaults
    /// whose type disagrees with the feature kind.
    pub fn new(features: Vec<Feature>) -> Result<Self> {
        if features.is_empty() {
            return Err(HubError::Configuration("schema has no features".to_string()));
        }

        let mut seen = HashSet::with_capacity(features.len());
        for feature in &features {
            if feature.name.trim().is_empty() {
                return Err(HubError::Configuration("feature name must not be blank".to_string()));
            }
            if !seen.insert(feature.name.as_str()) {
                return Err(HubError::Configuration(format!(
                    "duplicate feature '{}'",
                    feature.name
                )));
            }
            if !feature.default.matches(feature.kind) {
                return Err(HubError::Configuration(format!(
                    "default for '{}' does not match its {:?} kind",
                    feature.name, feature.kind
                )));
            }
        }

        Ok(Self { features })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature names in declared order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn numeric_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names_of(FeatureKind::Numeric)
    }

    pub fn categorical_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names_of(FeatureKind::Categorical)
    }

    fn names_of(&self, kind: FeatureKind) -> impl Iterator<Item = &str> + '_ {
        self.features
            .iter()
            .filter(move |f| f.kind == kind)
            .map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.get(name).map(|f| f.kind)
    }

    /// Defaults rendered as raw strings, in declared order
    pub fn default_inputs(&self) -> Vec<(String, String)> {
        self.features
            .iter()
            .map(|f| (f.name.clone(), f.default.to_input_string()))
            .collect()
    }

    /// Defaults as a raw input mapping, ready for coercion
    pub fn default_raw_input(&self) -> RawInput {
        self.default_inputs().into_iter().collect()
    }
}

/// Kind of output the bound model produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Classification,
    Regression,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Classification => write!(f, "classification"),
            TaskKind::Regression => write!(f, "regression"),
        }
    }
}

/// One prediction page: a model artifact plus the schema it was trained on
#[derive(Debug, Clone, Serialize)]
pub struct ModelPage {
    /// Stable identifier used in URLs and on the command line
    pub id: String,
    pub title: String,
    pub task: TaskKind,
    /// Artifact stem inside the models directory
    pub artifact: String,
    /// File name offered for exported predictions
    pub download_name: String,
    pub schema: FeatureSchema,
}

/// Fixed set of pages known at deployment time
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    pages: Vec<ModelPage>,
}

impl SchemaRegistry {
    pub fn new(pages: Vec<ModelPage>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(pages.len());
        for page in &pages {
            if !seen.insert(page.id.as_str()) {
                return Err(HubError::Configuration(format!("duplicate model id '{}'", page.id)));
            }
        }
        Ok(Self { pages })
    }

    /// The wheat seeds classifier, used car and Melbourne housing regressors
    pub fn builtin() -> Result<Self> {
        Self::new(builtin::pages()?)
    }

    pub fn pages(&self) -> &[ModelPage] {
        &self.pages
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.pages.iter().map(|p| p.id.as_str())
    }

    pub fn page(&self, id: &str) -> Result<&ModelPage> {
        self.pages
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| HubError::Configuration(format!("unknown model '{}'", id)))
    }

    pub fn schema(&self, id: &str) -> Result<&FeatureSchema> {
        self.page(id).map(|p| &p.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_partitions_features() {
        let schema = FeatureSchema::new(vec![
            Feature::numeric("Rooms", 3.0),
            Feature::categorical("Region", "Western Metropolitan"),
            Feature::numeric("Latitude", -37.718),
        ])
        .unwrap();

        let numeric: Vec<&str> = schema.numeric_names().collect();
        let categorical: Vec<&str> = schema.categorical_names().collect();
        assert_eq!(numeric, vec!["Rooms", "Latitude"]);
        assert_eq!(categorical, vec!["Region"]);
        assert_eq!(schema.len(), numeric.len() + categorical.len());
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let result = FeatureSchema::new(vec![
            Feature::numeric("Area", 1.0),
            Feature::categorical("Area", "x"),
        ]);
        assert!(matches!(result, Err(HubError::Configuration(_))));
    }

    #[test]
    fn test_schema_rejects_mismatched_default() {
        let result = FeatureSchema::new(vec![Feature {
            name: "Seats".to_string(),
            kind: FeatureKind::Numeric,
            default: DefaultValue::Text("five".to_string()),
        }]);
        assert!(matches!(result, Err(HubError::Configuration(_))));
    }

    #[test]
    fn test_schema_rejects_empty() {
        assert!(FeatureSchema::new(Vec::new()).is_err());
    }

    #[test]
    fn test_default_rendering() {
        assert_eq!(DefaultValue::Number(15.26).to_input_string(), "15.26");
        assert_eq!(DefaultValue::Number(2015.0).to_input_string(), "2015");
        assert_eq!(DefaultValue::Number(-37.718).to_input_string(), "-37.718");
        assert_eq!(DefaultValue::Text("PI".into()).to_input_string(), "PI");
    }

    #[test]
    fn test_unknown_model_is_configuration_error() {
        let registry = SchemaRegistry::builtin().unwrap();
        let err = registry.page("iris").unwrap_err();
        assert!(matches!(err, HubError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_page_ids_rejected() {
        let registry = SchemaRegistry::builtin().unwrap();
        let mut pages = registry.pages().to_vec();
        pages.push(pages[0].clone());
        assert!(SchemaRegistry::new(pages).is_err());
    }
}
