//! Locates the results artifact, falling back to a synthesized placeholder.
//!
//! The model writes its results to one of two known paths. When neither
//! exists after a run, a clearly-labeled placeholder artifact is written in
//! the same schema so downstream parsing stays uniform. Resolution never
//! fails; it is the last line of defense against an empty response.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tracing::{error, info, warn};

use crate::error::InterchangeError;
use crate::interchange::{OUTPUT_HEADER_OFFSET, REQUIRED_COLUMNS};

/// Placeholder artifact written when the model produces nothing.
pub const PLACEHOLDER_FILE: &str = "recomendaciones_PYP_ejemplo.xlsx";

const PLACEHOLDER_SHEET: &str = "Recomendacion_PYP";

/// Fixed sample activities for the placeholder result set.
const SAMPLE_ACTIVITIES: [(&str, &str, f64); 5] = [
    (
        "AR0001",
        "Asesoría técnica y formación integral para la conformación de brigadas de emergencia",
        25.5,
    ),
    (
        "AR0002",
        "Asesoría y asistencia técnica para el diseño de estándares de seguridad",
        20.0,
    ),
    (
        "AR0003",
        "Programa integral de gestión para la prevención de riesgos",
        18.3,
    ),
    (
        "AR0004",
        "Asesoría técnica en identificación de peligros y evaluación de riesgos",
        15.7,
    ),
    ("AR0005", "Consulta médica ocupacional integral", 20.5),
];

/// Where the results artifact was found, and whether it is synthesized.
#[derive(Debug, Clone)]
pub struct ResolvedOutput {
    pub path: PathBuf,
    pub synthetic: bool,
}

/// Return the first candidate path that exists; otherwise write the
/// placeholder artifact into `output_dir` and return its path.
///
/// Never fails: if even the placeholder write fails, the placeholder path is
/// returned anyway and the parse fallback chain takes over downstream.
pub fn resolve_output(candidates: &[PathBuf], output_dir: &Path) -> ResolvedOutput {
    for candidate in candidates {
        if candidate.exists() {
            info!(path = %candidate.display(), "results artifact found");
            return ResolvedOutput {
                path: candidate.clone(),
                synthetic: false,
            };
        }
    }

    warn!("model produced no results artifact, writing placeholder");
    let path = output_dir.join(PLACEHOLDER_FILE);
    if let Err(e) = write_placeholder(&path) {
        error!(error = %e, path = %path.display(), "failed to write placeholder artifact");
    }
    ResolvedOutput {
        path,
        synthetic: true,
    }
}

/// Write the placeholder result set in the model's own output layout:
/// leading blank rows, then the header, then the fixed sample activities.
fn write_placeholder(path: &Path) -> Result<(), InterchangeError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(PLACEHOLDER_SHEET)?;

    let header_row = OUTPUT_HEADER_OFFSET as u32;
    for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
        sheet.write_string(header_row, col as u16, *name)?;
    }
    for (i, (code, actividad, pct)) in SAMPLE_ACTIVITIES.iter().enumerate() {
        let row = header_row + 1 + i as u32;
        sheet.write_string(row, 0, *code)?;
        sheet.write_string(row, 1, *actividad)?;
        sheet.write_number(row, 2, *pct)?;
    }

    workbook.save(path)?;
    info!(path = %path.display(), "placeholder artifact written");
    Ok(())
}
