//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Where the remember-me credential file lives.
    pub prefs_path: PathBuf,
    /// When true, `login` verifies the password against the stored value
    /// instead of the reference email-only check.
    pub require_password_match: bool,
    /// When true, the store starts with the sample data set.
    pub seed_sample_data: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure tests
    /// are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prefs_path = std::env::var("PREFS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./attendance_prefs.json"));

        let require_password_match = parse_bool("REQUIRE_PASSWORD_MATCH", false)?;
        let seed_sample_data = parse_bool("SEED_SAMPLE_DATA", true)?;

        Ok(Self {
            bind_address,
            log_level,
            prefs_path,
            require_password_match,
            seed_sample_data,
        })
    }
}

fn parse_bool(var: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<bool>()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
    }
}
