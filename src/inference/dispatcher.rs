//! Prediction dispatch

use super::Predictor;
use crate::batch::validate_batch;
use crate::coercion::InputRow;
use crate::error::{HubError, Result};
use crate::schema::FeatureSchema;
use polars::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Input columns followed by the model's prediction columns
#[derive(Debug, Clone)]
pub struct PredictionResult {
    table: DataFrame,
    prediction_columns: Vec<String>,
}

impl PredictionResult {
    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut DataFrame {
        &mut self.table
    }

    pub fn into_table(self) -> DataFrame {
        self.table
    }

    pub fn prediction_columns(&self) -> &[String] {
        &self.prediction_columns
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }
}

/// Run `predictor` over `features` and append its output.
///
/// Any failure inside the predictor, or output that does not line up with the
/// input, surfaces as a single [`HubError::Prediction`].
pub fn dispatch(predictor: &dyn Predictor, features: DataFrame) -> Result<PredictionResult> {
    let start = Instant::now();

    let predictions = predictor.predict(&features).map_err(|e| match e {
        HubError::Prediction(_) => e,
        other => HubError::prediction(other),
    })?;

    if predictions.height() != features.height() {
        return Err(HubError::Prediction(format!(
            "model returned {} rows for {} inputs",
            predictions.height(),
            features.height()
        )));
    }
    if predictions.width() == 0 {
        return Err(HubError::Prediction("model returned no prediction columns".to_string()));
    }

    let prediction_columns: Vec<String> = predictions
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let table = features
        .hstack(predictions.get_columns())
        .map_err(HubError::prediction)?;

    debug!(
        rows = table.height(),
        task = %predictor.task(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Prediction dispatched"
    );

    Ok(PredictionResult {
        table,
        prediction_columns,
    })
}

/// Predict a single coerced row
pub fn predict_row(
    predictor: &dyn Predictor,
    schema: &FeatureSchema,
    row: &InputRow,
) -> Result<PredictionResult> {
    let features = row.to_dataframe(schema)?;
    dispatch(predictor, features)
}

/// Validate an uploaded table, then predict every row
pub fn predict_batch(
    predictor: &dyn Predictor,
    schema: &FeatureSchema,
    table: &DataFrame,
) -> Result<PredictionResult> {
    let features = validate_batch(schema, table)?;
    dispatch(predictor, features)
}
