// src/config/mod.rs
// All values load from the environment, with .env support.

use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct FronteraConfig {
    // ── Server Configuration
    pub host: String,
    pub port: u16,
    pub cors_origin: String,

    // ── Model Layout
    pub content_dir: String,
    pub frontend_dir: String,

    // ── R Invocation
    pub rscript_binary: String,
    pub r_binary: String,
    pub r_timeout_seconds: u64,

    // ── Logging Configuration
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            // Trim whitespace and strip inline comments before parsing
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl FronteraConfig {
    pub fn from_env() -> Self {
        // Load from .env first if it exists; a missing file is not an error.
        let _ = dotenvy::dotenv();

        Self {
            host: env_var_or("FRONTERA_HOST", "0.0.0.0".to_string()),
            port: env_var_or("FRONTERA_PORT", 8000),
            cors_origin: env_var_or("FRONTERA_CORS_ORIGIN", "*".to_string()),
            content_dir: env_var_or("FRONTERA_CONTENT_DIR", "./content".to_string()),
            frontend_dir: env_var_or("FRONTERA_FRONTEND_DIR", "./frontend-simple".to_string()),
            rscript_binary: env_var_or("FRONTERA_RSCRIPT_BIN", "Rscript".to_string()),
            r_binary: env_var_or("FRONTERA_R_BIN", "R".to_string()),
            r_timeout_seconds: env_var_or("FRONTERA_R_TIMEOUT", 600),
            log_level: env_var_or("FRONTERA_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Time bound for one model run
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.r_timeout_seconds)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<FronteraConfig> = Lazy::new(FronteraConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FronteraConfig::from_env();

        assert_eq!(config.rscript_binary, "Rscript");
        assert_eq!(config.r_timeout_seconds, 600);
        assert!(!config.content_dir.is_empty());
    }

    #[test]
    fn test_bind_address() {
        let config = FronteraConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            cors_origin: "*".to_string(),
            content_dir: "./content".to_string(),
            frontend_dir: "./frontend-simple".to_string(),
            rscript_binary: "Rscript".to_string(),
            r_binary: "R".to_string(),
            r_timeout_seconds: 600,
            log_level: "info".to_string(),
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.run_timeout(), Duration::from_secs(600));
    }
}
