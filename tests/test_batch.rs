//! Integration tests: batch CSV validation and prediction

use polars::prelude::*;
use predictor_hub::batch::{read_csv_bytes, read_upload, validate_batch};
use predictor_hub::error::HubError;
use predictor_hub::inference::{predict_batch, LinearArtifact, LinearScorer, PREDICTION_LABEL};
use predictor_hub::schema::{SchemaRegistry, USED_CAR, WHEAT_SEEDS};
use std::collections::BTreeMap;

const CAR_HEADER: &str =
    "Year,Age,Kilometers_Driven,Log_Km,Mileage,Engine,Power,Seats,Fuel_Type,Transmission,Owner_Type,Location,Brand_Model,Brand";

fn car_csv(header: &str, rows: &[&str]) -> Vec<u8> {
    let mut csv = String::from(header);
    csv.push('\n');
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv.into_bytes()
}

fn power_model() -> LinearArtifact {
    LinearArtifact::regression(LinearScorer {
        label: None,
        intercept: 1.0,
        weights: BTreeMap::from([("Power".to_string(), 0.1)]),
        levels: BTreeMap::new(),
    })
}

#[test]
fn test_car_batch_missing_engine_is_rejected() {
    let registry = SchemaRegistry::builtin().unwrap();
    let page = registry.page(USED_CAR).unwrap();
    let header = CAR_HEADER.replace(",Engine", "");
    let table = read_csv_bytes(&car_csv(
        &header,
        &["2015,5,50000,10.82,15,90,5,Petrol,Manual,First,Mumbai,Maruti Alto,Maruti"],
    ))
    .unwrap();

    match predict_batch(&power_model(), &page.schema, &table) {
        Err(HubError::Schema { missing }) => assert_eq!(missing, vec!["Engine"]),
        other => panic!("expected schema error, got {:?}", other.map(|r| r.height())),
    }
}

#[test]
fn test_every_missing_column_is_listed() {
    let registry = SchemaRegistry::builtin().unwrap();
    let schema = registry.schema(WHEAT_SEEDS).unwrap();
    let table = read_csv_bytes(b"Area,Length\n15.26,5.763\n").unwrap();

    let err = validate_batch(schema, &table).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing columns in CSV: ['Compactness', 'AsymmetryCoeff', 'Groove']"
    );
}

#[test]
fn test_extra_columns_are_dropped_and_order_follows_schema() {
    let registry = SchemaRegistry::builtin().unwrap();
    let schema = registry.schema(WHEAT_SEEDS).unwrap();
    let table = read_csv_bytes(
        b"Id,Groove,Area,Length,Compactness,AsymmetryCoeff,Notes\n1,5.22,15.26,5.763,0.871,2.221,x\n",
    )
    .unwrap();

    let features = validate_batch(schema, &table).unwrap();
    let names: Vec<String> = features.get_column_names().iter().map(|s| s.to_string()).collect();
    assert_eq!(names, vec!["Area", "Compactness", "Length", "AsymmetryCoeff", "Groove"]);
}

#[test]
fn test_categorical_columns_are_tagged() {
    let registry = SchemaRegistry::builtin().unwrap();
    let schema = registry.schema(USED_CAR).unwrap();
    let table = read_csv_bytes(&car_csv(
        CAR_HEADER,
        &["2015,5,50000,10.82,15,1200,90,5,Petrol,Manual,First,Mumbai,Maruti Alto,Maruti"],
    ))
    .unwrap();

    let features = validate_batch(schema, &table).unwrap();
    for name in schema.categorical_names() {
        assert!(
            matches!(features.column(name).unwrap().dtype(), DataType::Categorical(_, _)),
            "{} should be categorical",
            name
        );
    }
    assert_eq!(features.column("Power").unwrap().dtype(), &DataType::Int64);
}

// Batch uploads are not parsed cell by cell the way form input is: a
// non-numeric cell in a numeric column passes validation and only the model
// can reject it.
#[test]
fn test_batch_numeric_cells_are_not_checked() {
    let registry = SchemaRegistry::builtin().unwrap();
    let schema = registry.schema(USED_CAR).unwrap();
    let table = read_csv_bytes(&car_csv(
        CAR_HEADER,
        &[
            "2015,5,50000,10.82,15,1200,90,5,Petrol,Manual,First,Mumbai,Maruti Alto,Maruti",
            "2015,5,50000,10.82,15,1200,fast,5,Petrol,Manual,First,Mumbai,Maruti Alto,Maruti",
        ],
    ))
    .unwrap();

    let features = validate_batch(schema, &table).unwrap();
    assert_eq!(features.height(), 2);

    let err = predict_batch(&power_model(), schema, &table).unwrap_err();
    assert!(matches!(err, HubError::Prediction(_)));
    assert!(err.to_string().contains("row 2"));
}

#[test]
fn test_batch_prediction_appends_label_column() {
    let registry = SchemaRegistry::builtin().unwrap();
    let schema = registry.schema(USED_CAR).unwrap();
    let table = read_csv_bytes(&car_csv(
        CAR_HEADER,
        &[
            "2015,5,50000,10.82,15,1200,90,5,Petrol,Manual,First,Mumbai,Maruti Alto,Maruti",
            "2018,2,20000,9.9,18,1500,120,5,Diesel,Automatic,First,Pune,Honda City,Honda",
        ],
    ))
    .unwrap();

    let result = predict_batch(&power_model(), schema, &table).unwrap();
    assert_eq!(result.height(), 2);
    assert_eq!(result.table().width(), schema.len() + 1);

    let labels = result.table().column(PREDICTION_LABEL).unwrap().f64().unwrap();
    assert!((labels.get(0).unwrap() - 10.0).abs() < 1e-9);
    assert!((labels.get(1).unwrap() - 13.0).abs() < 1e-9);
}

#[test]
fn test_non_csv_upload_is_rejected() {
    let err = read_upload("cars.xlsx", b"Engine\n1200\n").unwrap_err();
    assert!(matches!(err, HubError::Parse(_)));
    assert!(read_upload("CARS.CSV", b"Engine\n1200\n").is_ok());
}
