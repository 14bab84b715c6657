//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::analyzer::analyze_lines;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Decode uploaded bytes to text, falling back to lossy UTF-8 for invalid
/// byte sequences rather than rejecting the file.
fn decode_lines(bytes: &[u8]) -> Vec<String> {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    };
    text.lines().map(|l| l.to_string()).collect()
}

/// Analyze a log file upload (`logfile` field, `.log`/`.txt` only) or a raw
/// text blob (`logcontent` field).
pub async fn analyze_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        let lines = match name.as_str() {
            "logfile" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !file_name.ends_with(".log") && !file_name.ends_with(".txt") {
                    return Err(ServerError::BadRequest(
                        "Only .log or .txt files are supported".to_string(),
                    ));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                info!(file = %file_name, bytes = data.len(), "Received log file");
                decode_lines(&data)
            }
            "logcontent" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.to_string()))?;
                text.lines().map(|l| l.to_string()).collect()
            }
            _ => continue,
        };

        let findings = analyze_lines(&state.bundle, &lines)?;
        info!(lines = lines.len(), findings = findings.len(), "Batch analyzed");
        return Ok(Json(serde_json::json!({ "predictions": findings })));
    }

    Err(ServerError::BadRequest("No input provided".to_string()))
}

#[derive(Deserialize)]
pub struct AnalyzeLinesRequest {
    lines: Vec<String>,
}

/// Analyze a JSON batch of raw lines.
pub async fn analyze_json(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeLinesRequest>,
) -> Result<Json<serde_json::Value>> {
    let findings = analyze_lines(&state.bundle, &request.lines)?;
    Ok(Json(serde_json::json!({ "predictions": findings })))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Metadata about the loaded model bundle.
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "vocab_size": state.bundle.vocab_size(),
        "feature_width": state.bundle.feature_width(),
        "stages": ["isolation_forest", "local_outlier_factor", "one_class_boundary"],
    }))
}
