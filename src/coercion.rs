//! Single-row input coercion
//!
//! Turns one form submission (a raw string per feature) into a typed
//! [`InputRow`]. Every field is checked before deciding, so a submission with
//! three bad numbers reports all three.

use crate::batch::tag_categorical;
use crate::error::{HubError, Result};
use crate::schema::{Feature, FeatureKind, FeatureSchema};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Raw form values keyed by feature name
pub type RawInput = HashMap<String, String>;

/// A typed feature value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

/// One schema-conformant record, in the schema's declared order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputRow {
    values: Vec<(String, FeatureValue)>,
}

impl InputRow {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> + '_ {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One-row frame with categorical columns tagged the same way as a batch upload
    pub fn to_dataframe(&self, schema: &FeatureSchema) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .values
            .iter()
            .map(|(name, value)| {
                let series = match value {
                    FeatureValue::Number(v) => Series::new(name.as_str().into(), &[*v]),
                    FeatureValue::Text(s) => Series::new(name.as_str().into(), &[s.as_str()]),
                };
                series.into()
            })
            .collect();

        let df = DataFrame::new(columns)?;
        tag_categorical(schema, df)
    }
}

fn coerce_field(feature: &Feature, raw: Option<&String>) -> std::result::Result<FeatureValue, String> {
    let raw = raw.ok_or_else(|| format!("{} is required", feature.name))?;
    let trimmed = raw.trim();

    match feature.kind {
        FeatureKind::Numeric => trimmed
            .parse::<f64>()
            .map(FeatureValue::Number)
            .map_err(|_| format!("{} must be numeric", feature.name)),
        FeatureKind::Categorical => Ok(FeatureValue::Text(trimmed.to_string())),
    }
}

/// Coerce raw form values against `schema`.
///
/// Returns the typed row, or one message per failing field in schema order.
/// Keys not named by the schema are ignored.
pub fn coerce(schema: &FeatureSchema, raw: &RawInput) -> std::result::Result<InputRow, Vec<String>> {
    let (values, errors) = schema.features().iter().fold(
        (Vec::with_capacity(schema.len()), Vec::new()),
        |(mut values, mut errors), feature| {
            match coerce_field(feature, raw.get(&feature.name)) {
                Ok(value) => values.push((feature.name.clone(), value)),
                Err(message) => errors.push(message),
            }
            (values, errors)
        },
    );

    if errors.is_empty() {
        Ok(InputRow { values })
    } else {
        Err(errors)
    }
}

/// [`coerce`] with the failure wrapped as [`HubError::Validation`]
pub fn coerce_input(schema: &FeatureSchema, raw: &RawInput) -> Result<InputRow> {
    coerce(schema, raw).map_err(HubError::Validation)
}
