use secrecy::{ExposeSecret, SecretString};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io/v1";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub api_key: Option<SecretString>,
    pub agent_id: Option<String>,
    pub api_base: String,
    pub topics_dir: Option<PathBuf>,
    pub log_level: Level,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("has_api_key", &self.has_api_key())
            .field("agent_id", &self.agent_id)
            .field("api_base", &self.api_base)
            .field("topics_dir", &self.topics_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// This function will look for a `.env` file in the current directory
    /// and load the following variables:
    ///
    /// *   `BIND_ADDRESS`: The address and port to bind the server to. Defaults to "0.0.0.0:3000".
    /// *   `ELEVENLABS_API_KEY`: Secret key for the voice provider.
    /// *   `ELEVENLABS_AGENT_ID`: The provider agent every session is opened against.
    /// *   `ELEVENLABS_API_BASE`: (Optional) REST base URL.
    ///     Defaults to "https://api.elevenlabs.io/v1".
    /// *   `TOPICS_DIR`: (Optional) Directory of topic JSON files replacing the built-in catalog.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    ///
    /// The key and agent id are not required here; the health route reports them.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind_address_str =
            non_empty("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let api_key = non_empty("ELEVENLABS_API_KEY").map(SecretString::from);
        let agent_id = non_empty("ELEVENLABS_AGENT_ID");
        let api_base = non_empty("ELEVENLABS_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let topics_dir = non_empty("TOPICS_DIR").map(PathBuf::from);

        let log_level_str = non_empty("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            api_key,
            agent_id,
            api_base,
            topics_dir,
            log_level,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    pub fn has_agent_id(&self) -> bool {
        self.agent_id.is_some()
    }

    /// Everything that keeps the broker from issuing sessions, by variable name.
    pub fn missing(&self) -> Vec<ConfigError> {
        let mut missing = Vec::new();
        if !self.has_api_key() {
            missing.push(ConfigError::MissingVar("ELEVENLABS_API_KEY".to_string()));
        }
        if !self.has_agent_id() {
            missing.push(ConfigError::MissingVar("ELEVENLABS_AGENT_ID".to_string()));
        }
        missing
    }
}
