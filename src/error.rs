// src/error.rs
// Standardized error types for the Frontera pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the spreadsheet interchange with the R model.
#[derive(Error, Debug)]
pub enum InterchangeError {
    #[error("results file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("spreadsheet structure does not match the expected layout: {0}")]
    SchemaMismatch(String),

    #[error("spreadsheet read error: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("spreadsheet write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from invoking the external R process.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("external process timed out after {0} seconds")]
    Timeout(u64),

    #[error("external process exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("failed to launch external process: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_path() {
        let err = InterchangeError::NotFound(PathBuf::from("/tmp/missing.xlsx"));
        assert!(err.to_string().contains("missing.xlsx"));
    }

    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let err = RunnerError::NonZeroExit {
            code: 1,
            stderr: "object 'frontera' not found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("status 1"));
        assert!(text.contains("object 'frontera' not found"));
    }

    #[test]
    fn test_timeout_names_the_bound() {
        let err = RunnerError::Timeout(600);
        assert!(err.to_string().contains("600 seconds"));
    }
}
