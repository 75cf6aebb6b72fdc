use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "biometrics.toml";

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub analysis: AnalysisConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub cors_origin: String,
}

/// Timers of a live biometric session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tick_interval_ms: u64,
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

/// Remote scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            analysis: AnalysisConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 2,
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            tick_interval_ms: 100,
            heartbeat_interval_secs: 30,
            client_timeout_secs: 60,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            endpoint: "http://localhost:3000/api/analyze".to_string(),
            timeout_ms: 5000,
        }
    }
}

/// Load configuration from `.env`, the TOML file and environment variables,
/// in increasing order of precedence
pub fn load_config() -> Result<Config> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    let mut config = match config_file_path() {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            load_from_file(&path)?
        }
        None => Config::default(),
    };

    load_from_env(&mut config);
    validate(&config)?;

    debug!("Configuration: {:?}", config);
    Ok(config)
}

fn config_file_path() -> Option<PathBuf> {
    match env::var("CONFIG_FILE") {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default.exists() {
                Some(default)
            } else {
                None
            }
        }
    }
}

/// Load configuration from a TOML file; missing keys keep their defaults
pub fn load_from_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to open configuration file {}", path.display()))?;

    toml::from_str(&contents).context("Failed to parse configuration file")
}

/// Apply environment variable overrides. Unparsable numbers are ignored.
fn load_from_env(config: &mut Config) {
    if let Ok(host) = env::var("API_HOST") {
        config.api.host = host;
    }

    if let Ok(port) = env::var("API_PORT") {
        if let Ok(port) = port.parse() {
            config.api.port = port;
        }
    }

    if let Ok(workers) = env::var("API_WORKERS") {
        if let Ok(workers) = workers.parse() {
            config.api.workers = workers;
        }
    }

    if let Ok(origin) = env::var("CORS_ORIGIN") {
        config.api.cors_origin = origin;
    }

    if let Ok(interval) = env::var("TICK_INTERVAL_MS") {
        if let Ok(interval) = interval.parse() {
            config.session.tick_interval_ms = interval;
        }
    }

    if let Ok(endpoint) = env::var("ANALYSIS_ENDPOINT") {
        config.analysis.endpoint = endpoint;
    }

    if let Ok(timeout) = env::var("ANALYSIS_TIMEOUT_MS") {
        if let Ok(timeout) = timeout.parse() {
            config.analysis.timeout_ms = timeout;
        }
    }

    if let Ok(level) = env::var("LOG_LEVEL") {
        config.log_level = level;
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.session.tick_interval_ms == 0 {
        bail!("session.tick_interval_ms must be greater than zero");
    }
    if config.api.workers == 0 {
        bail!("api.workers must be greater than zero");
    }
    if config.analysis.endpoint.trim().is_empty() {
        bail!("analysis.endpoint must not be empty");
    }
    Ok(())
}
