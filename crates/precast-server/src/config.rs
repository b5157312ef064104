//! Server configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `config/precast.toml`, then `PRECAST__*` environment variables
//! (`PRECAST__DATABASE_PATH`, `PRECAST__REQUEST_TIMEOUT_MS`, ...). A `.env`
//! file in the working directory is loaded into the environment first.

#![allow(clippy::result_large_err)]

use ::config::{Config, Environment, File};
use precast_core::errors::{ExError, ExErrorKind, Result};
use precast_core::logging_facility::Profile;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config/precast";
const ENV_PREFIX: &str = "PRECAST";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_log_profile")]
    pub log_profile: Profile,
    /// Deadline for one engine call, including the SQLite work
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("precast.db")
}

fn default_log_profile() -> Profile {
    Profile::Development
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: default_database_path(),
            log_profile: default_log_profile(),
            request_timeout_ms: default_request_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl ServerConfig {
    /// Load from `config/precast.toml` (optional) and the environment
    ///
    /// # Errors
    ///
    /// `ERR_CONFIG` when a source exists but cannot be parsed or a value has
    /// the wrong type.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from the given file stem (extension optional) and the environment
    ///
    /// # Errors
    ///
    /// `ERR_CONFIG` on unreadable or ill-typed configuration.
    pub fn load_from(file: &str) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let settings = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(config_error)?;

        let cfg: ServerConfig = settings.try_deserialize().map_err(config_error)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(ExError::new(ExErrorKind::Config)
                .with_op("load_config")
                .with_message("request_timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn config_error(err: ::config::ConfigError) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(err.to_string())
}
