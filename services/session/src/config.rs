//! Application Configuration Module
//!
//! Settings of the terminal session client, loaded from the environment.

use tracing::Level;

/// Samples per microphone chunk handed to the resampler.
pub const INPUT_CHUNK_SIZE: usize = 1024;
/// How long the agent may stay silent before it is considered done speaking.
pub const QUIET_WINDOW_MS: u64 = 1500;

const DEFAULT_BROKER_URL: &str = "http://localhost:3000";

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub broker_url: String,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `BROKER_URL`: (Optional) Base URL of the session broker.
    ///     Defaults to "http://localhost:3000".
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let broker_url = lookup("BROKER_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BROKER_URL.to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            broker_url,
            log_level,
        })
    }
}
