//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

use rust_decimal::Decimal;

use crate::store::AtomicityMode;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Balance granted to accounts created without an explicit one
    pub default_initial_balance: Decimal,

    /// Which transaction-scope backing the service runs with
    pub atomicity_mode: AtomicityMode,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let default_initial_balance: Decimal = env::var("DEFAULT_INITIAL_BALANCE")
            .unwrap_or_else(|_| "100.00".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DEFAULT_INITIAL_BALANCE"))?;

        if default_initial_balance < Decimal::ZERO {
            return Err(ConfigError::InvalidValue("DEFAULT_INITIAL_BALANCE"));
        }

        let atomicity_mode = env::var("ATOMICITY_MODE")
            .unwrap_or_else(|_| "transactional".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("ATOMICITY_MODE"))?;

        Ok(Self {
            host,
            port,
            default_initial_balance,
            atomicity_mode,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
