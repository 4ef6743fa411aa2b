//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::HubError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Hub(#[from] HubError),
}

impl ServerError {
    fn status_and_messages(&self) -> (StatusCode, Vec<String>) {
        match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, vec![msg.clone()]),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, vec![msg.clone()]),
            ServerError::Unavailable(msg) => {
                tracing::warn!(detail = %msg, "Request for unavailable model");
                (StatusCode::SERVICE_UNAVAILABLE, vec![msg.clone()])
            }
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, vec!["An internal error occurred".to_string()])
            }
            ServerError::Hub(err) => match err {
                HubError::Validation(_) | HubError::Schema { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.messages())
                }
                HubError::Parse(_) => (StatusCode::BAD_REQUEST, err.messages()),
                HubError::Configuration(_) => (StatusCode::NOT_FOUND, err.messages()),
                HubError::Prediction(msg) => {
                    tracing::warn!(detail = %msg, "Prediction failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, err.messages())
                }
                HubError::Io(e) => {
                    tracing::error!(detail = %e, "IO error");
                    (StatusCode::INTERNAL_SERVER_ERROR, vec!["A file system error occurred".to_string()])
                }
                HubError::Serialization(msg) => {
                    tracing::error!(detail = %msg, "Serialization error");
                    (StatusCode::INTERNAL_SERVER_ERROR, vec!["An internal error occurred".to_string()])
                }
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, errors) = self.status_and_messages();

        let body = Json(json!({
            "error": true,
            "message": errors.join(" | "),
            "errors": errors,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
