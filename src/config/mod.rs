use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub places: PlacesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Length of generated session codes
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Default candidate count when a session doesn't specify one
    #[serde(default = "default_max_candidates")]
    pub default_max_candidates: i64,
    /// Default search radius for candidate seeding, in meters
    #[serde(default = "default_radius_m")]
    pub default_radius_m: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            default_max_candidates: default_max_candidates(),
            default_radius_m: default_radius_m(),
        }
    }
}

fn default_code_length() -> usize {
    6
}

fn default_max_candidates() -> i64 {
    30
}

fn default_radius_m() -> u32 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacesConfig {
    /// API key for the places search service
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_places_base_url")]
    pub base_url: String,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_places_base_url(),
        }
    }
}

fn default_places_base_url() -> String {
    "https://api.geoapify.com/v2/places".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
