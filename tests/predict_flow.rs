// tests/predict_flow.rs
// End-to-end tests for the prediction pipeline, driving the router with a
// stand-in shell script instead of the real R model.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::util::ServiceExt;

use frontera::api::http::app_router;
use frontera::state::{AppState, ModelPaths};

/// App state rooted in a temp dir, with `sh` standing in for Rscript and the
/// given shell body as the model script.
fn state_with_script(content: &Path, script_body: &str, timeout_secs: u64) -> Arc<AppState> {
    let paths = ModelPaths::new(content);
    paths.ensure_dirs().unwrap();
    std::fs::create_dir_all(&paths.src_dir).unwrap();
    std::fs::write(paths.main_script(), script_body).unwrap();
    Arc::new(AppState {
        paths,
        frontend_dir: content.join("frontend"),
        rscript_binary: "sh".to_string(),
        r_binary: "echo".to_string(),
        run_timeout: Duration::from_secs(timeout_secs),
        run_lock: Mutex::new(()),
    })
}

fn valid_body() -> Value {
    json!({
        "sector_econom": "comercio ",
        "tamano_emp": "Mediana",
        "activ_econ": "6201",
        "sucursal": "antioquia",
        "num_empleados": 50,
        "tasa_deseada": 5.5
    })
}

async fn post_predict(state: Arc<AppState>, body: Value) -> (StatusCode, Value) {
    let app = app_router(state, "*");
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Write a results artifact the way the model does: 3 leading rows, header,
/// data rows, and a trailing footer sentence.
fn write_model_artifact(path: &Path, rows: &[(&str, &str, f64)], footer: Option<&str>) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in ["codigo_actividad", "ACTIVIDAD", "porcentaje_recomendado"]
        .iter()
        .enumerate()
    {
        sheet.write_string(3, col as u16, *name).unwrap();
    }
    for (i, (code, name, pct)) in rows.iter().enumerate() {
        let row = 4 + i as u32;
        sheet.write_string(row, 0, *code).unwrap();
        sheet.write_string(row, 1, *name).unwrap();
        sheet.write_number(row, 2, *pct).unwrap();
    }
    if let Some(text) = footer {
        sheet
            .write_string(5 + rows.len() as u32, 0, text)
            .unwrap();
    }
    workbook.save(path).unwrap();
}

#[tokio::test]
async fn predict_returns_placeholder_when_model_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let state = state_with_script(tmp.path(), "exit 0\n", 30);

    let (status, body) = post_predict(state, valid_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let activities = body["actividades_recomendadas"].as_array().unwrap();
    assert!(!activities.is_empty());
    assert_eq!(body["metadata"]["total_actividades"], activities.len());
    assert_eq!(
        body["metadata"]["archivo_fuente"],
        "recomendaciones_PYP_ejemplo.xlsx"
    );
    assert_eq!(body["metadata"]["datos_sinteticos"], true);
    assert_eq!(body["metadata"]["suma_porcentajes"], 100.0);
    assert_eq!(body["excel_download_url"], "/api/download/results");
}

#[tokio::test]
async fn predict_parses_real_artifact_and_footer() {
    let tmp = tempfile::tempdir().unwrap();
    let state = state_with_script(tmp.path(), "exit 0\n", 30);
    write_model_artifact(
        &state.paths.primary_output(),
        &[("AR0001", "Desc A", 25.5), ("AR0002", "Desc B", 20.0)],
        Some(
            "El modelo presenta un error de estimación del 2.5% y la diferencia \
             con la tasa deseada es de 1.3. Los valores corresponden a los \
             criterios deseados de nivel histórico departamental.",
        ),
    );

    let (status, body) = post_predict(state, valid_body()).await;

    assert_eq!(status, StatusCode::OK);

    // Echoed input is normalized: sector and branch uppercased and trimmed.
    assert_eq!(body["input_data"]["Sector_Econom"], "COMERCIO");
    assert_eq!(body["input_data"]["Sucursal"], "ANTIOQUIA");
    assert_eq!(body["input_data"]["Num_Empleados"], 50);

    let activities = body["actividades_recomendadas"].as_array().unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0]["codigo_actividad"], "AR0001");
    assert_eq!(activities[1]["porcentaje_recomendado"], 20.0);

    let metadata = &body["metadata"];
    assert_eq!(metadata["total_actividades"], 2);
    assert!((metadata["suma_porcentajes"].as_f64().unwrap() - 45.5).abs() < 0.01);
    assert_eq!(metadata["archivo_fuente"], "Recomendacion_PYP.xlsx");
    assert_eq!(metadata["datos_sinteticos"], false);
    assert_eq!(metadata["error_estimacion_porcentaje"], 2.5);
    assert_eq!(metadata["diferencia_tasa"], 1.3);
    assert_eq!(
        metadata["nivel_historico_usado"],
        "nivel histórico departamental"
    );
    assert!(metadata["footer_completo"]
        .as_str()
        .unwrap()
        .contains("error de estimación"));
}

#[tokio::test]
async fn invalid_request_is_rejected_before_running_the_model() {
    let tmp = tempfile::tempdir().unwrap();
    // The stand-in script leaves a marker so an unwanted invocation is
    // observable.
    let state = state_with_script(tmp.path(), "touch ran.marker\n", 30);
    let marker = state.paths.content_dir.join("ran.marker");

    for (field, value) in [
        ("num_empleados", json!(0)),
        ("num_empleados", json!(-5)),
        ("tasa_deseada", json!(150.0)),
        ("tasa_deseada", json!(-1.0)),
        ("sucursal", json!("   ")),
    ] {
        let mut body = valid_body();
        body[field] = value;
        let (status, _) = post_predict(state.clone(), body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "field {field}");
    }

    assert!(!marker.exists(), "model must not run for invalid input");
}

#[tokio::test]
async fn missing_field_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let state = state_with_script(tmp.path(), "exit 0\n", 30);

    let mut body = valid_body();
    body.as_object_mut().unwrap().remove("tasa_deseada");
    let (status, _) = post_predict(state, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn script_failure_surfaces_stderr() {
    let tmp = tempfile::tempdir().unwrap();
    let state = state_with_script(
        tmp.path(),
        "echo 'objeto frontera no encontrado' >&2\nexit 1\n",
        30,
    );

    let (status, body) = post_predict(state, valid_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("objeto frontera no encontrado"));
}

#[tokio::test]
async fn missing_script_returns_internal_error() {
    let tmp = tempfile::tempdir().unwrap();
    let state = state_with_script(tmp.path(), "exit 0\n", 30);
    std::fs::remove_file(state.paths.main_script()).unwrap();

    let (status, body) = post_predict(state, valid_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("Script R"));
}

#[tokio::test]
async fn timeout_returns_504_and_stops_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let state = state_with_script(tmp.path(), "exec sleep 30\n", 1);

    let started = Instant::now();
    let (status, body) = post_predict(state, valid_body()).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["message"].as_str().unwrap().contains("Timeout"));
    // The handler must come back at the bound, not wait out the child.
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn unparseable_artifact_degrades_to_sentinel_row() {
    let tmp = tempfile::tempdir().unwrap();
    let state = state_with_script(tmp.path(), "exit 0\n", 30);
    // A primary artifact that is not a spreadsheet at all, and no fallback
    // artifact: the response must still carry one sentinel activity.
    std::fs::write(state.paths.primary_output(), b"this is not an xlsx file").unwrap();

    let (status, body) = post_predict(state, valid_body()).await;

    assert_eq!(status, StatusCode::OK);
    let activities = body["actividades_recomendadas"].as_array().unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0]["codigo_actividad"], "AR0000");
    assert_eq!(body["metadata"]["datos_sinteticos"], true);
}
