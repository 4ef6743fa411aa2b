//! Linear scorer artifacts
//!
//! A regression artifact holds one scorer; a classification artifact holds one
//! scorer per class and predicts the class with the highest softmax
//! probability.

use super::{Predictor, PREDICTION_LABEL, PREDICTION_SCORE};
use crate::error::{HubError, Result};
use crate::schema::{FeatureKind, FeatureSchema, TaskKind};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Decimal places kept on classification scores
const SCORE_DECIMALS: i32 = 4;

/// Intercept plus per-feature contributions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearScorer {
    /// Class label; required for classification, ignored for regression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub intercept: f64,
    /// Coefficient per numeric feature
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Offset per categorical level; unseen levels contribute nothing
    #[serde(default)]
    pub levels: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Serialized model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub task: TaskKind,
    pub scorers: Vec<LinearScorer>,
}

impl LinearArtifact {
    pub fn regression(scorer: LinearScorer) -> Self {
        Self {
            task: TaskKind::Regression,
            scorers: vec![scorer],
        }
    }

    pub fn classification(scorers: Vec<LinearScorer>) -> Self {
        Self {
            task: TaskKind::Classification,
            scorers,
        }
    }

    /// Check the artifact's own shape
    pub fn validate(&self) -> Result<()> {
        match self.task {
            TaskKind::Regression if self.scorers.len() != 1 => Err(HubError::Configuration(format!(
                "regression artifact needs exactly one scorer, found {}",
                self.scorers.len()
            ))),
            TaskKind::Classification if self.scorers.len() < 2 => Err(HubError::Configuration(
                "classification artifact needs at least two classes".to_string(),
            )),
            TaskKind::Classification if self.scorers.iter().any(|s| s.label.is_none()) => Err(
                HubError::Configuration("every class scorer needs a label".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Check that every referenced feature exists in `schema` with the right kind
    pub fn check_schema(&self, schema: &FeatureSchema) -> Result<()> {
        for scorer in &self.scorers {
            let numeric = scorer.weights.keys().map(|k| (k, FeatureKind::Numeric));
            let categorical = scorer.levels.keys().map(|k| (k, FeatureKind::Categorical));
            for (name, expected) in numeric.chain(categorical) {
                match schema.kind_of(name) {
                    Some(kind) if kind == expected => {}
                    Some(kind) => {
                        return Err(HubError::Configuration(format!(
                            "artifact treats '{}' as {:?} but the schema declares it {:?}",
                            name, expected, kind
                        )))
                    }
                    None => {
                        return Err(HubError::Configuration(format!(
                            "artifact references unknown feature '{}'",
                            name
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// Load an artifact from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Save the artifact as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn score(&self, scorer: &LinearScorer, features: &DataFrame) -> Result<Vec<f64>> {
        let mut scores = vec![scorer.intercept; features.height()];

        for (name, weight) in &scorer.weights {
            let values = numeric_values(features, name)?;
            for (score, value) in scores.iter_mut().zip(values) {
                *score += weight * value;
            }
        }

        for (name, offsets) in &scorer.levels {
            let values = text_values(features, name)?;
            for (score, value) in scores.iter_mut().zip(values) {
                if let Some(offset) = value.and_then(|v| offsets.get(&v)) {
                    *score += offset;
                }
            }
        }

        if let Some(row) = scores.iter().position(|s| !s.is_finite()) {
            return Err(HubError::Prediction(format!("non-finite score in row {}", row + 1)));
        }

        Ok(scores)
    }
}

fn feature_column<'a>(features: &'a DataFrame, name: &str) -> Result<&'a Column> {
    features
        .column(name)
        .map_err(|_| HubError::Prediction(format!("model expects column '{}'", name)))
}

fn numeric_values(features: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = feature_column(features, name)?
        .cast(&DataType::Float64)
        .map_err(HubError::prediction)?;
    let values = column.f64().map_err(HubError::prediction)?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                HubError::Prediction(format!(
                    "column '{}' has a missing or non-numeric value in row {}",
                    name,
                    i + 1
                ))
            })
        })
        .collect()
}

fn text_values(features: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = feature_column(features, name)?
        .cast(&DataType::String)
        .map_err(HubError::prediction)?;
    let values = column.str().map_err(HubError::prediction)?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

fn round_score(p: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (p * factor).round() / factor
}

impl Predictor for LinearArtifact {
    fn task(&self) -> TaskKind {
        self.task
    }

    fn predict(&self, features: &DataFrame) -> Result<DataFrame> {
        self.validate()?;

        match self.task {
            TaskKind::Regression => {
                let estimates = self.score(&self.scorers[0], features)?;
                let column: Column = Series::new(PREDICTION_LABEL.into(), estimates).into();
                Ok(DataFrame::new(vec![column])?)
            }
            TaskKind::Classification => {
                let per_class = self
                    .scorers
                    .iter()
                    .map(|s| self.score(s, features))
                    .collect::<Result<Vec<_>>>()?;

                let mut labels = Vec::with_capacity(features.height());
                let mut probabilities = Vec::with_capacity(features.height());

                for row in 0..features.height() {
                    let max = per_class
                        .iter()
                        .map(|scores| scores[row])
                        .fold(f64::NEG_INFINITY, f64::max);
                    let exps: Vec<f64> = per_class.iter().map(|scores| (scores[row] - max).exp()).collect();
                    let total: f64 = exps.iter().sum();

                    // first class wins ties
                    let (best, best_exp) = exps
                        .iter()
                        .enumerate()
                        .fold((0, f64::NEG_INFINITY), |acc, (i, &e)| if e > acc.1 { (i, e) } else { acc });

                    labels.push(self.scorers[best].label.clone().unwrap_or_default());
                    probabilities.push(round_score(best_exp / total));
                }

                Ok(DataFrame::new(vec![
                    Series::new(PREDICTION_LABEL.into(), labels).into(),
                    Series::new(PREDICTION_SCORE.into(), probabilities).into(),
                ])?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car_scorer() -> LinearScorer {
        LinearScorer {
            label: None,
            intercept: 1.0,
            weights: BTreeMap::from([("Power".to_string(), 0.1)]),
            levels: BTreeMap::from([(
                "Fuel_Type".to_string(),
                BTreeMap::from([("Diesel".to_string(), 2.0)]),
            )]),
        }
    }

    fn class_scorer(label: &str, intercept: f64, area: f64) -> LinearScorer {
        LinearScorer {
            label: Some(label.to_string()),
            intercept,
            weights: BTreeMap::from([("Area".to_string(), area)]),
            levels: BTreeMap::new(),
        }
    }

    #[test]
    fn test_regression_scores_rows() {
        let artifact = LinearArtifact::regression(car_scorer());
        let df = df!(
            "Power" => &[90.0, 100.0],
            "Fuel_Type" => &["Petrol", "Diesel"]
        )
        .unwrap();

        let preds = artifact.predict(&df).unwrap();
        let values: Vec<f64> = preds
            .column(PREDICTION_LABEL)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(preds.width(), 1);
        assert!((values[0] - 10.0).abs() < 1e-9);
        assert!((values[1] - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification_picks_most_probable() {
        let artifact = LinearArtifact::classification(vec![
            class_scorer("1", 0.0, 0.0),
            class_scorer("2", -34.0, 2.0),
        ]);
        let df = df!("Area" => &[15.26, 18.72]).unwrap();

        let preds = artifact.predict(&df).unwrap();
        let labels: Vec<&str> = preds
            .column(PREDICTION_LABEL)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(labels, vec!["1", "2"]);

        let scores = preds.column(PREDICTION_SCORE).unwrap().f64().unwrap();
        for score in scores.into_no_null_iter() {
            assert!(score > 0.5 && score <= 1.0);
        }
    }

    #[test]
    fn test_non_numeric_cell_is_prediction_error() {
        let artifact = LinearArtifact::regression(car_scorer());
        let df = df!(
            "Power" => &["90", "lots"],
            "Fuel_Type" => &["Petrol", "Diesel"]
        )
        .unwrap();

        let err = artifact.predict(&df).unwrap_err();
        assert!(matches!(err, HubError::Prediction(ref m) if m.contains("row 2")));
    }

    #[test]
    fn test_nan_input_is_rejected_for_classification() {
        let artifact = LinearArtifact::classification(vec![
            class_scorer("1", 0.0, 0.0),
            class_scorer("2", -34.0, 2.0),
        ]);
        let df = df!("Area" => &[15.26, f64::NAN]).unwrap();

        let err = artifact.predict(&df).unwrap_err();
        assert!(matches!(err, HubError::Prediction(ref m) if m == "non-finite score in row 2"));
    }

    #[test]
    fn test_infinite_input_is_rejected_for_regression() {
        let artifact = LinearArtifact::regression(car_scorer());
        let df = df!(
            "Power" => &[f64::INFINITY],
            "Fuel_Type" => &["Petrol"]
        )
        .unwrap();

        let err = artifact.predict(&df).unwrap_err();
        assert!(matches!(err, HubError::Prediction(ref m) if m.contains("row 1")));
    }

    #[test]
    fn test_missing_column_is_prediction_error() {
        let artifact = LinearArtifact::regression(car_scorer());
        let df = df!("Power" => &[90.0]).unwrap();
        assert!(matches!(artifact.predict(&df), Err(HubError::Prediction(_))));
    }

    #[test]
    fn test_validate_shapes() {
        let mut artifact = LinearArtifact::regression(car_scorer());
        assert!(artifact.validate().is_ok());
        artifact.scorers.push(car_scorer());
        assert!(artifact.validate().is_err());

        let unlabeled = LinearArtifact::classification(vec![car_scorer(), car_scorer()]);
        assert!(unlabeled.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usedcar_price_model.json");
        let artifact = LinearArtifact::regression(car_scorer());
        artifact.save(&path).unwrap();
        assert_eq!(LinearArtifact::load(&path).unwrap(), artifact);
    }
}
