// src/state.rs
// Shared application state and the on-disk layout of the model content root.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::FronteraConfig;

pub const INPUT_FILE: &str = "Input_frontera.xlsx";
pub const PRIMARY_OUTPUT: &str = "Recomendacion_PYP.xlsx";
pub const ALTERNATE_OUTPUT: &str = "recomendaciones_PYP.xlsx";
pub const MAIN_SCRIPT: &str = "Frontera.R";
pub const UTILS_SCRIPT: &str = "frontera_utils.R";

/// Fixed file layout under the model content root.
///
/// The R script resolves every path relative to this root, so the same root
/// is handed to the process invoker as the subprocess working directory.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub content_dir: PathBuf,
    pub input_dir: PathBuf,
    pub src_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ModelPaths {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        let content_dir = content_dir.into();
        Self {
            input_dir: content_dir.join("input"),
            src_dir: content_dir.join("src"),
            output_dir: content_dir.join("output"),
            content_dir,
        }
    }

    /// Create the writable directories the pipeline needs.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.input_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Interchange file the model reads.
    pub fn input_file(&self) -> PathBuf {
        self.input_dir.join(INPUT_FILE)
    }

    /// Path where the model normally writes its results.
    pub fn primary_output(&self) -> PathBuf {
        self.content_dir.join(PRIMARY_OUTPUT)
    }

    /// Alternate results path some model versions write instead.
    pub fn alternate_output(&self) -> PathBuf {
        self.output_dir.join(ALTERNATE_OUTPUT)
    }

    /// Candidate results paths, in resolution order.
    pub fn output_candidates(&self) -> [PathBuf; 2] {
        [self.primary_output(), self.alternate_output()]
    }

    /// Placeholder artifact written when the model produces nothing.
    pub fn placeholder_output(&self) -> PathBuf {
        self.output_dir.join(crate::resolver::PLACEHOLDER_FILE)
    }

    pub fn main_script(&self) -> PathBuf {
        self.src_dir.join(MAIN_SCRIPT)
    }

    pub fn utils_script(&self) -> PathBuf {
        self.src_dir.join(UTILS_SCRIPT)
    }
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub paths: ModelPaths,
    pub frontend_dir: PathBuf,
    pub rscript_binary: String,
    pub r_binary: String,
    pub run_timeout: Duration,
    /// Single-slot lock: the interchange files are shared singletons on
    /// disk, so concurrent prediction runs must not interleave on them.
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: &FronteraConfig) -> Self {
        Self {
            paths: ModelPaths::new(&config.content_dir),
            frontend_dir: PathBuf::from(&config.frontend_dir),
            rscript_binary: config.rscript_binary.clone(),
            r_binary: config.r_binary.clone(),
            run_timeout: config.run_timeout(),
            run_lock: Mutex::new(()),
        }
    }
}
