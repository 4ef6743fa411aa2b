//! Predictor hub - schema-validated inference against pre-trained models
//!
//! Each deployed model is exposed as a page with a fixed feature schema. A
//! page accepts either one form submission or an uploaded CSV, checks it
//! against the schema, hands it to the model and returns the inputs with the
//! prediction columns appended, ready to display or download.
//!
//! # Modules
//!
//! ## Core
//! - [`schema`] - feature schemas and the page registry
//! - [`coercion`] - single-row raw input to typed row, with every field error collected
//! - [`batch`] - CSV ingestion and batch column validation
//! - [`inference`] - model loading, the [`inference::Predictor`] seam, prediction dispatch
//! - [`export`] - CSV and JSON rendering of prediction tables
//!
//! ## Services
//! - [`server`] - HTTP server with a REST API per page
//! - [`cli`] - command-line interface

// Core error handling
pub mod error;

// Core
pub mod schema;
pub mod coercion;
pub mod batch;
pub mod inference;
pub mod export;

// Services
pub mod server;
pub mod cli;

pub use error::{HubError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{HubError, Result};

    pub use crate::schema::{DefaultValue, Feature, FeatureKind, FeatureSchema, ModelPage, SchemaRegistry, TaskKind};

    pub use crate::coercion::{coerce, coerce_input, FeatureValue, InputRow, RawInput};

    pub use crate::batch::{read_csv_bytes, read_csv_path, read_upload, validate_batch};

    pub use crate::inference::{
        dispatch, predict_batch, predict_row, LinearArtifact, LinearScorer, ModelLoader, PredictionResult,
        Predictor, PREDICTION_LABEL, PREDICTION_SCORE,
    };

    pub use crate::export::{export_csv, json_table, write_csv};
}
