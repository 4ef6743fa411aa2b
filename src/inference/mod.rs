//! Model loading and prediction dispatch
//!
//! The hub never computes predictions itself. It hands a validated frame to a
//! [`Predictor`] and glues the returned prediction columns onto the inputs.
//! Predictors are passed in explicitly, so tests can swap in a stub.
//!
//! - [`ModelLoader`] resolves a page's artifact and loads it once at startup
//! - [`LinearArtifact`] is the JSON scorer format the loader understands
//! - [`dispatch`], [`predict_row`] and [`predict_batch`] run one interaction

mod dispatcher;
mod linear;
mod loader;

pub use dispatcher::{dispatch, predict_batch, predict_row, PredictionResult};
pub use linear::{LinearArtifact, LinearScorer};
pub use loader::ModelLoader;

use crate::error::Result;
use crate::schema::TaskKind;
use polars::prelude::*;

/// Predicted class, or the numeric estimate for regression
pub const PREDICTION_LABEL: &str = "prediction_label";

/// Probability of the predicted class (classification only)
pub const PREDICTION_SCORE: &str = "prediction_score";

/// A loaded, read-only model
///
/// Implementations must be deterministic for a fixed input and return exactly
/// one row per input row, holding only the prediction columns.
pub trait Predictor: Send + Sync {
    fn task(&self) -> TaskKind;

    fn predict(&self, features: &DataFrame) -> Result<DataFrame>;
}
