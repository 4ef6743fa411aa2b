//! HTTP request handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use polars::prelude::DataFrame;
use serde::Deserialize;
use tracing::info;

use crate::batch::read_upload;
use crate::coercion::{coerce_input, RawInput};
use crate::export::{attachment_disposition, export_csv, json_table, CSV_CONTENT_TYPE};
use crate::inference::{predict_batch, predict_row, PredictionResult};

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// Hub Handlers
// ============================================================================

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let models: Vec<serde_json::Value> = state
        .registry()
        .pages()
        .iter()
        .map(|page| {
            let available = state.slot(&page.id).map(|s| s.is_ready()).unwrap_or(false);
            serde_json::json!({
                "id": page.id,
                "title": page.title,
                "task": page.task,
                "features": page.schema.len(),
                "available": available,
            })
        })
        .collect();

    Json(serde_json::json!({ "models": models }))
}

pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let page = state
        .registry()
        .page(&model_id)
        .map_err(|_| ServerError::NotFound(format!("Unknown model: {}", model_id)))?;

    let features: Vec<serde_json::Value> = page
        .schema
        .features()
        .iter()
        .map(|f| {
            serde_json::json!({
                "name": f.name,
                "kind": f.kind,
                "default": f.default.to_input_string(),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "id": page.id,
        "title": page.title,
        "task": page.task,
        "download_name": page.download_name,
        "features": features,
    })))
}

// ============================================================================
// Prediction Handlers
// ============================================================================

#[derive(Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    inputs: HashMap<String, serde_json::Value>,
}

/// Form values arrive as strings; bare JSON numbers and booleans are accepted
/// and read as their text. `null` counts as a missing field.
fn raw_input(inputs: HashMap<String, serde_json::Value>) -> RawInput {
    inputs
        .into_iter()
        .filter_map(|(name, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((name, s)),
            other => Some((name, other.to_string())),
        })
        .collect()
}

fn result_json(result: &PredictionResult, message: &str) -> Result<Json<serde_json::Value>> {
    let table = json_table(result.table())?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": message,
        "prediction_columns": result.prediction_columns(),
        "table": table,
    })))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
    request: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    let Json(request) = request.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let (page, predictor) = state.page(&model_id)?;

    let raw = raw_input(request.inputs);
    let row = coerce_input(&page.schema, &raw)?;
    let result = predict_row(predictor.as_ref(), &page.schema, &row)?;

    info!(model = %page.id, "Single prediction complete");
    result_json(&result, "Prediction complete!")
}

/// Multipart field carrying the uploaded CSV
const UPLOAD_FIELD: &str = "file";

/// Pull the uploaded CSV out of the `file` part of a multipart body
async fn read_upload_field(multipart: &mut Multipart) -> Result<DataFrame> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        info!(file = %file_name, bytes = data.len(), "Received upload");
        return Ok(read_upload(&file_name, &data)?);
    }

    Err(ServerError::BadRequest(format!("No '{}' field in upload", UPLOAD_FIELD)))
}

async fn run_batch(
    state: &AppState,
    model_id: &str,
    multipart: &mut Multipart,
) -> Result<(String, PredictionResult)> {
    let (page, predictor) = state.page(model_id)?;
    let table = read_upload_field(multipart).await?;
    let result = predict_batch(predictor.as_ref(), &page.schema, &table)?;

    info!(model = %page.id, rows = result.height(), "Batch prediction complete");
    Ok((page.download_name.clone(), result))
}

pub async fn predict_batch_upload(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let (_, result) = run_batch(&state, &model_id, &mut multipart).await?;
    result_json(&result, "Batch prediction complete!")
}

pub async fn download_batch_predictions(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (download_name, mut result) = run_batch(&state, &model_id, &mut multipart).await?;
    let csv = export_csv(result.table_mut())?;

    let disposition = HeaderValue::from_str(&attachment_disposition(&download_name))
        .map_err(|e| ServerError::Internal(format!("Invalid header: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(CSV_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

// ============================================================================
// Hub page
// ============================================================================

pub async fn serve_index(State(state): State<Arc<AppState>>) -> Html<String> {
    let items: String = state
        .registry()
        .pages()
        .iter()
        .map(|page| {
            let status = match state.slot(&page.id) {
                Some(slot) if slot.is_ready() => "ready",
                _ => "unavailable",
            };
            format!(
                "<li><strong>{}</strong> <code>{}</code> ({}, {})</li>",
                page.title, page.id, page.task, status
            )
        })
        .collect();

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>ML Predictor Hub</title></head>
<body>
<h1>Welcome to the ML Predictor Hub</h1>
<p>This hub serves {count} pre-trained models:</p>
<ol>{items}</ol>
<p>Fetch <code>/api/models/&lt;id&gt;/schema</code> for a model's input form, then
POST to <code>/api/models/&lt;id&gt;/predict</code> or upload a CSV to
<code>/api/models/&lt;id&gt;/predict/batch</code>.</p>
</body>
</html>"#,
        count = state.registry().pages().len(),
        items = items,
    ))
}
