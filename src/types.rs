//! Request and response types for the prediction pipeline.
//!
//! All of these are request-scoped value objects: nothing here outlives a
//! single request/response cycle except the on-disk interchange files.

use serde::{Deserialize, Serialize};

/// Round to two decimal places, the precision used throughout the API.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Request types
// ============================================================================

/// The six business attributes the model consumes.
///
/// Field names follow the JSON API; the PascalCase aliases match the column
/// names the R model uses, so callers may send either form.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(alias = "Sector_Econom")]
    pub sector_econom: String,
    #[serde(alias = "Tamano_Emp")]
    pub tamano_emp: String,
    #[serde(alias = "Activ_Econ")]
    pub activ_econ: String,
    #[serde(alias = "Sucursal")]
    pub sucursal: String,
    #[serde(alias = "Num_Empleados")]
    pub num_empleados: i64,
    pub tasa_deseada: f64,
}

impl PredictRequest {
    /// Domain validation. Out-of-range values are request failures, never
    /// silent defaults.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("sector_econom", &self.sector_econom),
            ("tamano_emp", &self.tamano_emp),
            ("activ_econ", &self.activ_econ),
            ("sucursal", &self.sucursal),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be empty"));
            }
        }
        if self.num_empleados <= 0 {
            return Err("num_empleados must be a positive integer".to_string());
        }
        if !self.tasa_deseada.is_finite() || !(0.0..=100.0).contains(&self.tasa_deseada) {
            return Err("tasa_deseada must be between 0 and 100".to_string());
        }
        Ok(())
    }

    /// Build the normalized record written to the interchange file.
    pub fn normalize(&self) -> InputRecord {
        InputRecord {
            sector_econom: self.sector_econom.trim().to_uppercase(),
            tamano_emp: self.tamano_emp.trim().to_string(),
            activ_econ: self.activ_econ.trim().to_string(),
            sucursal: self.sucursal.trim().to_uppercase(),
            num_empleados: self.num_empleados,
            tasa_deseada: self.tasa_deseada,
        }
    }
}

/// Normalized projection of a [`PredictRequest`], serialized with the exact
/// column names the R model expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(rename = "Sector_Econom")]
    pub sector_econom: String,
    #[serde(rename = "Tamano_Emp")]
    pub tamano_emp: String,
    #[serde(rename = "Activ_Econ")]
    pub activ_econ: String,
    #[serde(rename = "Sucursal")]
    pub sucursal: String,
    #[serde(rename = "Num_Empleados")]
    pub num_empleados: i64,
    pub tasa_deseada: f64,
}

// ============================================================================
// Response types
// ============================================================================

/// One recommended activity parsed from the results spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub codigo_actividad: String,
    pub actividad: String,
    pub porcentaje_recomendado: f64,
}

impl ResultRow {
    /// Last-resort row substituted when neither the real artifact nor the
    /// fallback artifact can be parsed.
    pub fn sentinel() -> Self {
        Self {
            codigo_actividad: "AR0000".to_string(),
            actividad: "Error: Verificar generación de Excel por R".to_string(),
            porcentaje_recomendado: 100.0,
        }
    }
}

/// Metadata attached to every prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub total_actividades: usize,
    pub suma_porcentajes: f64,
    pub timestamp: String,
    pub archivo_fuente: String,
    /// True when the activity list came from placeholder or sentinel data
    /// instead of a real model run.
    pub datos_sinteticos: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_estimacion_porcentaje: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diferencia_tasa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nivel_historico_usado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_completo: Option<String>,
}

/// Full body of a successful `POST /api/predict` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub status: String,
    pub execution_time: f64,
    pub input_data: InputRecord,
    pub metadata: ResponseMetadata,
    pub actividades_recomendadas: Vec<ResultRow>,
    pub excel_download_url: String,
}

// ============================================================================
// Process types
// ============================================================================

/// Captured result of one external process invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}
