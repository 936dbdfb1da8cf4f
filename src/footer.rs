//! Best-effort extraction of summary metrics from the results footer.
//!
//! The footer is a free-text sentence the model appends below the tabular
//! results. Matching is pattern-based and isolated here so the rules can
//! change without touching the request flow; an unmatched field is simply
//! omitted, and extraction never fails.

use once_cell::sync::Lazy;
use regex::Regex;

static ERROR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"error de estimación del ([\d.]+)%").expect("footer pattern"));
static DIFF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"diferencia con la tasa deseada es de ([\d.]+)").expect("footer pattern"));
static NIVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"criterios deseados de (.+?)[.\n]").expect("footer pattern"));

/// Metrics recovered from the footer text. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FooterMetadata {
    pub error_estimacion_porcentaje: Option<f64>,
    pub diferencia_tasa: Option<f64>,
    pub nivel_historico_usado: Option<String>,
}

/// Extract whatever metrics the footer carries. Idempotent and
/// side-effect-free.
pub fn extract(footer: &str) -> FooterMetadata {
    let error_estimacion_porcentaje = ERROR_RE
        .captures(footer)
        .and_then(|caps| caps[1].parse().ok());

    // The deviation value sometimes arrives with a trailing sentence period.
    let diferencia_tasa = DIFF_RE
        .captures(footer)
        .and_then(|caps| caps[1].trim_end_matches('.').parse().ok());

    let nivel_historico_usado = NIVEL_RE
        .captures(footer)
        .map(|caps| caps[1].trim().to_string());

    FooterMetadata {
        error_estimacion_porcentaje,
        diferencia_tasa,
        nivel_historico_usado,
    }
}
