// src/api/http/predict.rs
// The prediction request state machine: validate, persist input, run the
// model, resolve and parse the artifact, extract footer metrics, respond.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::api::error::ApiError;
use crate::error::RunnerError;
use crate::footer;
use crate::interchange::{self, OUTPUT_HEADER_OFFSET};
use crate::resolver;
use crate::runner;
use crate::state::AppState;
use crate::types::{round2, PredictRequest, PredictResponse, ResponseMetadata, ResultRow};

pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let started = Instant::now();

    // 1-2. Validate and normalize. Nothing below runs for a bad request.
    request.validate().map_err(ApiError::unprocessable_entity)?;
    let input = request.normalize();
    info!(
        sector = %input.sector_econom,
        sucursal = %input.sucursal,
        empleados = input.num_empleados,
        tasa = input.tasa_deseada,
        "prediction request received"
    );

    // The interchange files are shared singletons on disk: hold the slot for
    // the whole write-run-parse sequence so concurrent requests serialize.
    let _slot = state.run_lock.lock().await;

    // 3. Persist the input where the model reads it.
    let input_path = state.paths.input_file();
    interchange::write_input(&input_path, &input).map_err(|e| {
        error!(error = %e, path = %input_path.display(), "failed to write model input");
        ApiError::internal("No se pudo escribir el archivo de entrada del modelo")
    })?;

    // 4. Run the model.
    let script = state.paths.main_script();
    let outcome = runner::run_script(
        &state.rscript_binary,
        &script,
        &state.paths.content_dir,
        state.run_timeout,
    )
    .await
    .map_err(|e| match e {
        RunnerError::ScriptNotFound(path) => {
            error!(path = %path.display(), "model script missing");
            ApiError::internal("Script R no encontrado")
        }
        RunnerError::Timeout(secs) => {
            error!(timeout_secs = secs, "model run timed out");
            ApiError::gateway_timeout("Timeout: El modelo tardó demasiado en ejecutar")
        }
        RunnerError::NonZeroExit { code, stderr } => {
            error!(exit_code = code, "model run failed");
            ApiError::internal(format!("Error en ejecución R:\n{stderr}"))
        }
        RunnerError::Io(e) => {
            error!(error = %e, "could not launch model process");
            ApiError::internal("No se pudo ejecutar el script R")
        }
    })?;
    debug!(
        stdout_preview = %outcome.stdout.chars().take(500).collect::<String>(),
        "model run completed"
    );

    // 5. Locate the artifact; a placeholder substitutes when none exists.
    let resolved = resolver::resolve_output(
        &state.paths.output_candidates(),
        &state.paths.output_dir,
    );

    // 6. Parse it; on any failure try the fallback artifact, then the
    // sentinel row. Parsing never fails the request.
    let mut synthetic = resolved.synthetic;
    let (rows, source): (Vec<ResultRow>, PathBuf) =
        match interchange::read_output(&resolved.path, OUTPUT_HEADER_OFFSET) {
            Ok(rows) => (rows, resolved.path),
            Err(e) => {
                warn!(
                    error = %e,
                    path = %resolved.path.display(),
                    "failed to parse results artifact, trying fallback"
                );
                synthetic = true;
                let fallback = state.paths.placeholder_output();
                match interchange::read_output(&fallback, OUTPUT_HEADER_OFFSET) {
                    Ok(rows) => (rows, fallback),
                    Err(e) => {
                        error!(error = %e, "fallback artifact unreadable, using sentinel row");
                        (vec![ResultRow::sentinel()], resolved.path)
                    }
                }
            }
        };

    // 7. Footer metrics, best effort.
    let footer_text = interchange::read_footer(&source);
    let footer_meta = footer_text.as_deref().map(footer::extract).unwrap_or_default();

    // 8. Assemble the response.
    let suma_porcentajes = round2(rows.iter().map(|r| r.porcentaje_recomendado).sum());
    let metadata = ResponseMetadata {
        total_actividades: rows.len(),
        suma_porcentajes,
        timestamp: Utc::now().to_rfc3339(),
        archivo_fuente: source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        datos_sinteticos: synthetic,
        error_estimacion_porcentaje: footer_meta.error_estimacion_porcentaje,
        diferencia_tasa: footer_meta.diferencia_tasa,
        nivel_historico_usado: footer_meta.nivel_historico_usado,
        footer_completo: footer_text,
    };

    let execution_time = round2(started.elapsed().as_secs_f64());
    info!(
        execution_time,
        total = metadata.total_actividades,
        synthetic = metadata.datos_sinteticos,
        "prediction completed"
    );

    Ok(Json(PredictResponse {
        status: "success".to_string(),
        execution_time,
        input_data: input,
        metadata,
        actividades_recomendadas: rows,
        excel_download_url: "/api/download/results".to_string(),
    }))
}
