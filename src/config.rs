use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub model: ModelSettings,
    #[serde(default)]
    pub prediction: PredictionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    /// Local path, `file://` URL or `http(s)://` URL of the artifact
    pub location: String,
    pub fetch_timeout_secs: Option<u64>,
    /// Overrides the artifact's own generation encoding
    pub generation_encoding: Option<HashMap<String, f64>>,
}

impl ModelSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.unwrap_or(30))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Classifier calls allowed on the blocking pool at once
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl PredictionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 { 2000 }
fn default_max_in_flight() -> usize { 64 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HEART_RISK__)
    /// 5. `MODEL_PATH` for the artifact location
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HEART_RISK__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        settings.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("HEART_RISK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// `MODEL_PATH` wins over any configured artifact location
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    if let Ok(location) = std::env::var("MODEL_PATH") {
        builder = builder.set_override("model.location", location)?;
    }

    builder.build()
}
