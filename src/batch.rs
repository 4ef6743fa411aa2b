//! Batch upload ingestion and validation
//!
//! An uploaded CSV becomes a [`DataFrame`], which is then checked against a
//! [`FeatureSchema`]: all required columns present, projected into schema
//! order, categorical columns tagged as such. Numeric cells are passed through
//! untouched; only the single-row path parses numbers.

use crate::error::{HubError, Result};
use crate::schema::FeatureSchema;
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

/// Rows scanned when inferring column types
const INFER_SCHEMA_ROWS: usize = 1000;

fn categorical_dtype() -> DataType {
    DataType::Categorical(None, CategoricalOrdering::Physical)
}

/// Parse CSV bytes with a header row
pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(HubError::Parse("uploaded file is empty".to_string()));
    }

    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    Ok(df)
}

/// Parse a CSV file from disk
pub fn read_csv_path(path: &Path) -> Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !ext.eq_ignore_ascii_case("csv") {
        return Err(HubError::Parse(format!("unsupported file format: '{}', expected csv", ext)));
    }

    let bytes = std::fs::read(path)?;
    read_csv_bytes(&bytes)
}

/// Parse an uploaded file, accepting only `.csv` names
pub fn read_upload(file_name: &str, bytes: &[u8]) -> Result<DataFrame> {
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(HubError::Parse(format!(
            "unsupported file '{}', upload a CSV file",
            file_name
        )));
    }
    read_csv_bytes(bytes)
}

/// Required columns absent from `table`, in schema order
pub fn missing_columns(schema: &FeatureSchema, table: &DataFrame) -> Vec<String> {
    let present: HashSet<&str> = table.get_column_names().iter().map(|s| s.as_str()).collect();
    schema
        .names()
        .filter(|name| !present.contains(name))
        .map(str::to_string)
        .collect()
}

/// Re-type every categorical feature column as a polars categorical.
///
/// Values go through a string cast first so integer-looking codes survive.
pub fn tag_categorical(schema: &FeatureSchema, mut df: DataFrame) -> Result<DataFrame> {
    let categorical = categorical_dtype();
    for name in schema.categorical_names() {
        let tagged = df
            .column(name)?
            .cast(&DataType::String)?
            .cast(&categorical)?;
        df.with_column(tagged)?;
    }
    Ok(df)
}

/// Validate and normalize an uploaded table.
///
/// Fails with [`HubError::Schema`] naming every missing column; otherwise keeps
/// only the schema's columns, in schema order, and tags the categorical ones.
pub fn validate_batch(schema: &FeatureSchema, table: &DataFrame) -> Result<DataFrame> {
    let missing = missing_columns(schema, table);
    if !missing.is_empty() {
        return Err(HubError::Schema { missing });
    }

    let projected = table.select(schema.names())?;
    tag_categorical(schema, projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Feature;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            Feature::numeric("Engine", 1200.0),
            Feature::categorical("Fuel_Type", "Petrol"),
            Feature::numeric("Seats", 5.0),
        ])
        .unwrap()
    }

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_read_csv_bytes() {
        let df = read_csv_bytes(b"Engine,Fuel_Type,Seats\n1200,Petrol,5\n1500,Diesel,7\n").unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_read_empty_bytes_is_parse_error() {
        assert!(matches!(read_csv_bytes(b""), Err(HubError::Parse(_))));
        assert!(matches!(read_csv_bytes(b"  \n"), Err(HubError::Parse(_))));
    }

    #[test]
    fn test_read_upload_rejects_non_csv() {
        let err = read_upload("cars.xlsx", b"Engine\n1\n").unwrap_err();
        assert!(matches!(err, HubError::Parse(_)));
        assert!(read_upload("CARS.CSV", b"Engine\n1\n").is_ok());
    }

    #[test]
    fn test_missing_columns_in_schema_order() {
        let df = df!("Fuel_Type" => &["Petrol"]).unwrap();
        assert_eq!(missing_columns(&schema(), &df), vec!["Engine", "Seats"]);
    }

    #[test]
    fn test_validate_projects_and_reorders() {
        let df = df!(
            "Seats" => &[5i64, 7],
            "Price" => &[4.5, 9.1],
            "Fuel_Type" => &["Petrol", "Diesel"],
            "Engine" => &[1200i64, 2000]
        )
        .unwrap();

        let normalized = validate_batch(&schema(), &df).unwrap();
        assert_eq!(column_names(&normalized), vec!["Engine", "Fuel_Type", "Seats"]);
        assert_eq!(normalized.height(), 2);
    }

    #[test]
    fn test_validate_tags_numeric_coded_categories() {
        let df = df!(
            "Engine" => &[1200.0],
            "Fuel_Type" => &[3i64],
            "Seats" => &[5.0]
        )
        .unwrap();

        let normalized = validate_batch(&schema(), &df).unwrap();
        assert!(matches!(
            normalized.column("Fuel_Type").unwrap().dtype(),
            DataType::Categorical(_, _)
        ));
        // numeric columns keep whatever type the reader inferred
        assert_eq!(normalized.column("Engine").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_validate_reports_all_missing() {
        let df = df!("Other" => &[1.0]).unwrap();
        match validate_batch(&schema(), &df) {
            Err(HubError::Schema { missing }) => {
                assert_eq!(missing, vec!["Engine", "Fuel_Type", "Seats"]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }
}
