//! Spreadsheet interchange with the R model.
//!
//! The model consumes a single-row XLSX written to a fixed path and produces
//! a results XLSX with a handful of leading non-data rows before the header.
//! Reading tolerates that offset; an optional trailing free-text footer row
//! carries human-readable summary metrics.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::error::InterchangeError;
use crate::types::{round2, InputRecord, ResultRow};

/// Column order the R model expects in the input file.
pub const INPUT_COLUMNS: [&str; 6] = [
    "Sector_Econom",
    "Tamano_Emp",
    "Activ_Econ",
    "Sucursal",
    "Num_Empleados",
    "tasa_deseada",
];

/// Columns that must all be present in the results header row.
pub const REQUIRED_COLUMNS: [&str; 3] = ["codigo_actividad", "ACTIVIDAD", "porcentaje_recomendado"];

/// Leading non-data rows the model writes before the results header.
pub const OUTPUT_HEADER_OFFSET: usize = 3;

/// Marker substrings that identify the footer row, lowercased.
const FOOTER_MARKERS: [&str; 2] = ["estimación", "diferencia"];

/// Write the normalized input record as a single-row spreadsheet, always
/// overwriting the fixed interchange path.
pub fn write_input(path: &Path, record: &InputRecord) -> Result<(), InterchangeError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, name) in INPUT_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    sheet.write_string(1, 0, record.sector_econom.as_str())?;
    sheet.write_string(1, 1, record.tamano_emp.as_str())?;
    sheet.write_string(1, 2, record.activ_econ.as_str())?;
    sheet.write_string(1, 3, record.sucursal.as_str())?;
    sheet.write_number(1, 4, record.num_empleados as f64)?;
    sheet.write_number(1, 5, record.tasa_deseada)?;

    workbook.save(path)?;
    debug!(path = %path.display(), "input interchange file written");
    Ok(())
}

/// Read an input interchange file back into a record.
pub fn read_input(path: &Path) -> Result<InputRecord, InterchangeError> {
    if !path.exists() {
        return Err(InterchangeError::NotFound(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = first_sheet_range(&mut workbook)?;
    let rows: Vec<&[Data]> = range.rows().collect();
    if rows.len() < 2 {
        return Err(InterchangeError::SchemaMismatch(
            "input sheet is missing the data row".to_string(),
        ));
    }

    fn cell<'a>(
        header: &[Data],
        data: &'a [Data],
        name: &str,
    ) -> Result<&'a Data, InterchangeError> {
        header
            .iter()
            .position(|c| cell_to_string(c).as_deref() == Some(name))
            .and_then(|idx| data.get(idx))
            .ok_or_else(|| InterchangeError::SchemaMismatch(format!("missing column {name}")))
    }

    let header = rows[0];
    let data = rows[1];
    Ok(InputRecord {
        sector_econom: cell_to_string(cell(header, data, "Sector_Econom")?).unwrap_or_default(),
        tamano_emp: cell_to_string(cell(header, data, "Tamano_Emp")?).unwrap_or_default(),
        activ_econ: cell_to_string(cell(header, data, "Activ_Econ")?).unwrap_or_default(),
        sucursal: cell_to_string(cell(header, data, "Sucursal")?).unwrap_or_default(),
        num_empleados: cell_to_f64(cell(header, data, "Num_Empleados")?).unwrap_or(0.0) as i64,
        tasa_deseada: cell_to_f64(cell(header, data, "tasa_deseada")?).unwrap_or(0.0),
    })
}

/// Read the results spreadsheet, skipping `header_offset` leading rows.
///
/// Rows missing the activity code or the percentage are dropped, which also
/// discards blank separator rows and the free-text footer.
pub fn read_output(path: &Path, header_offset: usize) -> Result<Vec<ResultRow>, InterchangeError> {
    if !path.exists() {
        return Err(InterchangeError::NotFound(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = first_sheet_range(&mut workbook)?;

    // calamine ranges start at the first populated cell, so leading rows the
    // model left entirely blank may already be skipped.
    let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let skip = header_offset.saturating_sub(start_row);
    let rows: Vec<&[Data]> = range.rows().collect();
    if rows.len() <= skip {
        return Err(InterchangeError::SchemaMismatch(format!(
            "no header row after skipping {header_offset} leading rows"
        )));
    }

    let header = rows[skip];
    let column = |name: &str| {
        header
            .iter()
            .position(|c| cell_to_string(c).as_deref() == Some(name))
    };
    let (Some(code_col), Some(name_col), Some(pct_col)) = (
        column(REQUIRED_COLUMNS[0]),
        column(REQUIRED_COLUMNS[1]),
        column(REQUIRED_COLUMNS[2]),
    ) else {
        let found: Vec<String> = header.iter().filter_map(cell_to_string).collect();
        return Err(InterchangeError::SchemaMismatch(format!(
            "required columns {REQUIRED_COLUMNS:?} not found in header {found:?}"
        )));
    };

    let mut results = Vec::new();
    for row in &rows[skip + 1..] {
        let code = row.get(code_col).and_then(cell_to_string);
        let pct = row.get(pct_col).and_then(cell_to_f64);
        let (Some(code), Some(pct)) = (code, pct) else {
            continue;
        };
        let actividad = row.get(name_col).and_then(cell_to_string).unwrap_or_default();
        results.push(ResultRow {
            codigo_actividad: code,
            actividad,
            porcentaje_recomendado: round2(pct),
        });
    }
    debug!(path = %path.display(), rows = results.len(), "results artifact parsed");
    Ok(results)
}

/// Scan the results file bottom-up for the free-text footer row.
///
/// Best effort: any read problem, or no row whose first cell carries one of
/// the marker substrings, yields `None`.
pub fn read_footer(path: &Path) -> Option<String> {
    let mut workbook: Xlsx<_> = open_workbook(path).ok()?;
    let range = first_sheet_range(&mut workbook).ok()?;
    let rows: Vec<&[Data]> = range.rows().collect();
    for row in rows.iter().rev() {
        if let Some(Data::String(text)) = row.first() {
            let lower = text.to_lowercase();
            if FOOTER_MARKERS.iter().any(|marker| lower.contains(marker)) {
                return Some(text.clone());
            }
        }
    }
    None
}

fn first_sheet_range<R>(workbook: &mut Xlsx<R>) -> Result<calamine::Range<Data>, InterchangeError>
where
    R: std::io::Read + std::io::Seek,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| InterchangeError::SchemaMismatch("workbook has no sheets".to_string()))?;
    Ok(workbook.worksheet_range(&sheet_name)?)
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

fn cell_to_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
