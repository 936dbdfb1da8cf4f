// src/api/http/handlers.rs
// Landing page, health, download and diagnostic handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use crate::api::error::ApiError;
use crate::runner;
use crate::state::AppState;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Serve the static landing page when present, else a JSON status message.
pub async fn root_handler(State(state): State<Arc<AppState>>) -> Response {
    let index = state.frontend_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => Json(json!({
            "message": "API Modelo Frontera está funcionando."
        }))
        .into_response(),
    }
}

/// Health check: API status plus availability of the external tool, the
/// content directories, and the expected R scripts.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let paths = &state.paths;
    Json(json!({
        "api": "healthy",
        "r_available": runner::binary_available(&state.r_binary),
        "directories": {
            "content": paths.content_dir.exists(),
            "input": paths.input_dir.exists(),
            "src": paths.src_dir.exists(),
            "output": paths.output_dir.exists(),
        },
        "r_scripts": {
            "frontera_r": paths.main_script().exists(),
            "frontera_utils": paths.utils_script().exists(),
        }
    }))
}

/// Diagnostic endpoint: report the external tool's version string.
pub async fn test_r_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match runner::probe_r(&state.r_binary).await {
        Ok(version) => Json(json!({
            "status": "success",
            "r_version": version,
            "rscript_available": runner::binary_available(&state.rscript_binary),
        })),
        Err(e) => Json(json!({
            "status": "error",
            "message": e.to_string(),
        })),
    }
}

/// Download the latest results spreadsheet, filename timestamped at download
/// time.
pub async fn download_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let mut candidates = state.paths.output_candidates().to_vec();
    candidates.push(state.paths.placeholder_output());

    for path in candidates {
        if !path.exists() {
            continue;
        }
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            error!(error = %e, path = %path.display(), "failed to read results artifact");
            ApiError::internal("No se pudo leer el archivo de resultados")
        })?;
        let filename = format!(
            "recomendaciones_{}.xlsx",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let headers = [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ];
        return Ok((headers, bytes).into_response());
    }

    Err(ApiError::not_found("Archivo de resultados no encontrado"))
}
