use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, error};

use crate::ws::RelaySettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated. Unset allows any origin.
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Root directory for documents, snapshots and chat history
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Users file for login, defaults to `<data_dir>/data.json`
    pub users_file: Option<PathBuf>,

    /// Silence after which an editor is no longer considered active
    #[serde(default = "default_presence_idle_ms")]
    pub presence_idle_ms: u64,

    /// Number of change-log entries kept
    #[serde(default = "default_change_log_capacity")]
    pub change_log_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn users_path(&self) -> PathBuf {
        self.users_file.clone().unwrap_or_else(|| self.data_dir.join("data.json"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            presence_idle: Duration::from_millis(self.presence_idle_ms),
            change_log_capacity: self.change_log_capacity,
        }
    }

    /// Allowed CORS origins, `None` meaning any
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origins
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() { None } else { Some(origins) }
    }

    /// Tracing filter used when `RUST_LOG` is unset
    pub fn log_filter(&self) -> String {
        let level = self.log_level.trim().to_lowercase();
        let crate_name = self.service_name.replace('-', "_");
        format!("{crate_name}={level},tower_http={level},axum::rejection=trace,{level}")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            log_level: default_log_level(),
            service_name: default_service_name(),
            data_dir: default_data_dir(),
            users_file: None,
            presence_idle_ms: default_presence_idle_ms(),
            change_log_capacity: default_change_log_capacity(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "colabri-sync".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_presence_idle_ms() -> u64 {
    5_000
}

fn default_change_log_capacity() -> usize {
    10
}
