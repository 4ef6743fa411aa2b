//! Error types for the predictor hub

use thiserror::Error;

/// Result type alias for hub operations
pub type Result<T> = std::result::Result<T, HubError>;

/// Main error type for the hub
///
/// Everything except `Configuration` is recoverable: the caller turns it into a
/// user-visible message and waits for the next interaction.
#[derive(Error, Debug)]
pub enum HubError {
    /// Unknown model identifier, malformed schema, or unusable model artifact
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// One message per offending field, in schema order
    #[error("{}", .0.join(" | "))]
    Validation(Vec<String>),

    /// Every required column absent from an uploaded table
    #[error("Missing columns in CSV: {}", format_missing(.missing))]
    Schema { missing: Vec<String> },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn format_missing(missing: &[String]) -> String {
    let quoted: Vec<String> = missing.iter().map(|m| format!("'{}'", m)).collect();
    format!("[{}]", quoted.join(", "))
}

impl HubError {
    pub fn prediction(err: impl std::fmt::Display) -> Self {
        HubError::Prediction(err.to_string())
    }

    /// Messages to show the user, one entry per problem
    pub fn messages(&self) -> Vec<String> {
        match self {
            HubError::Validation(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Whether the interaction can be retried after the user fixes their input
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, HubError::Configuration(_))
    }
}

impl From<polars::error::PolarsError> for HubError {
    fn from(err: polars::error::PolarsError) -> Self {
        HubError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Serialization(err.to_string())
    }
}
