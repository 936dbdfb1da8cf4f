//! External process invoker for the R model.
//!
//! The working directory is passed as subprocess configuration so the
//! script's relative file references resolve against the content root; the
//! service process never changes its own working directory.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;
use tracing::{error, info};

use crate::error::RunnerError;
use crate::types::ProcessOutcome;

/// Time bound for the `R --version` diagnostic probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the model script with a time bound, capturing stdout, stderr and the
/// exit status.
///
/// A run that exceeds `timeout` is terminated, not abandoned; a non-zero
/// exit maps to [`RunnerError::NonZeroExit`] carrying the captured stderr.
/// No retries.
pub async fn run_script(
    rscript_bin: &str,
    script: &Path,
    working_dir: &Path,
    timeout: Duration,
) -> Result<ProcessOutcome, RunnerError> {
    if !script.exists() {
        return Err(RunnerError::ScriptNotFound(script.to_path_buf()));
    }

    info!(
        command = %format!("{} {}", rscript_bin, script.display()),
        working_dir = %working_dir.display(),
        "running model script"
    );

    let mut cmd = Command::new(rscript_bin);
    cmd.arg(script)
        .current_dir(working_dir)
        .env("LC_ALL", "C.UTF-8")
        .env("LANG", "C.UTF-8")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Dropping the future on timeout must kill the child, not leak it.
        .kill_on_drop(true);

    let output = match time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(RunnerError::Io(e)),
        Err(_elapsed) => {
            error!(
                script = %script.display(),
                timeout_secs = timeout.as_secs(),
                "model script timed out, terminating"
            );
            return Err(RunnerError::Timeout(timeout.as_secs()));
        }
    };

    let outcome = ProcessOutcome {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    };

    if !outcome.success {
        error!(
            exit_code = outcome.exit_code,
            stderr = %outcome.stderr,
            "model script signaled failure"
        );
        return Err(RunnerError::NonZeroExit {
            code: outcome.exit_code,
            stderr: outcome.stderr,
        });
    }

    Ok(outcome)
}

/// Diagnostic probe: run `R --version` and return the first line of output.
pub async fn probe_r(r_bin: &str) -> Result<String, RunnerError> {
    let mut cmd = Command::new(r_bin);
    cmd.arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match time::timeout(PROBE_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(RunnerError::Io(e)),
        Err(_elapsed) => return Err(RunnerError::Timeout(PROBE_TIMEOUT.as_secs())),
    };

    if !output.status.success() {
        return Err(RunnerError::NonZeroExit {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().to_string())
}

/// Whether a binary can be invoked: an existing absolute path, or a name
/// found on `PATH`.
pub fn binary_available(bin: &str) -> bool {
    let path = Path::new(bin);
    if path.is_absolute() {
        return path.exists();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(bin).is_file()))
        .unwrap_or(false)
}
