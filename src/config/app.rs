//! Application configuration loading from config.toml
//!
//! Settings come from a TOML file (`config.toml` unless `SCHOOL_ADMISSION_CONFIG`
//! points elsewhere), with `DATABASE_URL` taking precedence over the file. A
//! missing file is not an error; every setting has a default.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Hard ceiling on operations in a single store batch.
pub const MAX_BATCH_OPERATIONS: usize = 500;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/school_admission.sqlite?mode=rwc";

/// Settings shared by the admin binary and the core operations.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// SeaORM connection URL
    pub database_url: String,
    /// Maximum operations per committed batch (1..=500)
    pub batch_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            batch_limit: MAX_BATCH_OPERATIONS,
        }
    }
}

impl AppConfig {
    /// Checks that the settings are usable.
    ///
    /// # Errors
    /// Returns `Error::Config` if the batch limit is zero or above the store ceiling.
    pub fn validate(&self) -> Result<()> {
        validate_batch_limit(self.batch_limit)
    }
}

/// Rejects batch limits the store would refuse.
///
/// # Errors
/// Returns `Error::Config` unless `1 <= limit <= 500`.
pub fn validate_batch_limit(limit: usize) -> Result<()> {
    if limit == 0 || limit > MAX_BATCH_OPERATIONS {
        return Err(Error::Config {
            message: format!("batch limit must be between 1 and {MAX_BATCH_OPERATIONS}, got {limit}"),
        });
    }
    Ok(())
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns `Error::Config` if the TOML is invalid or the values fail validation.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file, falling back to defaults when the file
/// does not exist.
///
/// # Errors
/// Returns an error if:
/// - The file exists but cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `SCHOOL_ADMISSION_CONFIG` (or `./config.toml`) and
/// applies the `DATABASE_URL` override.
pub fn load_app_config() -> Result<AppConfig> {
    let path = std::env::var("SCHOOL_ADMISSION_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config(&path)?;
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }
    Ok(config)
}
