//! Result export
//!
//! Prediction tables leave the hub either as a CSV download (UTF-8, header
//! row, one line per prediction) or as a column-oriented JSON table for
//! display.

use crate::error::Result;
use polars::prelude::*;
use serde_json::{json, Value};
use std::path::Path;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Serialize a table to CSV bytes
pub fn export_csv(table: &mut DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(table)?;
    Ok(buf)
}

/// Write a table to a CSV file on disk
pub fn write_csv(table: &mut DataFrame, path: &Path) -> Result<()> {
    let bytes = export_csv(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// `Content-Disposition` value offering `file_name` as an attachment
pub fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '\r' | '\n'))
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

fn cell_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => json!(v),
        AnyValue::Float64(v) => json!(v),
        AnyValue::Float32(v) => json!(v),
        AnyValue::Int64(v) => json!(v),
        AnyValue::Int32(v) => json!(v),
        AnyValue::UInt64(v) => json!(v),
        AnyValue::UInt32(v) => json!(v),
        AnyValue::String(v) => json!(v),
        AnyValue::StringOwned(v) => json!(v.as_str()),
        other => json!(other.to_string()),
    }
}

/// Column-oriented JSON rendering of a table
///
/// Categorical columns are rendered as their string values.
pub fn json_table(table: &DataFrame) -> Result<Value> {
    let mut columns = Vec::with_capacity(table.width());

    for col in table.get_columns() {
        let dtype = format!("{:?}", col.dtype());
        let readable = match col.dtype() {
            DataType::Categorical(_, _) => col.cast(&DataType::String)?,
            _ => col.clone(),
        };

        let mut values = Vec::with_capacity(readable.len());
        for i in 0..readable.len() {
            values.push(cell_to_json(readable.get(i)?));
        }

        columns.push(json!({
            "name": col.name().to_string(),
            "dtype": dtype,
            "values": values,
        }));
    }

    Ok(json!({
        "rows": table.height(),
        "columns": columns,
    }))
}
