//! Configuration management for ReportBox
//!
//! Settings are layered, later sources winning:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `.env` file
//! 4. Environment variables
//!
//! # Environment Variables
//!
//! Any key can be overridden with `REPORTBOX__<section>__<key>`:
//! - `REPORTBOX__SERVER__BIND_ADDR=127.0.0.1:9000`
//! - `REPORTBOX__LEDGER__INPUT_DIR=/srv/ledgers`
//! - `REPORTBOX__LEDGER__MAX_FILE_BYTES=16MB`
//! - `REPORTBOX__OUTPUT__NAMESPACE_BY_REQUEST=false`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/reportbox.toml`.
//! This can be overridden using the `REPORTBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, LedgerConfig, OutputConfig, RetentionConfig, ServerConfig};
pub use sources::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path plus the environment
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}
