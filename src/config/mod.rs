//! Application Configuration
//!
//! Service settings stored in TOML format. The inference API key may also
//! come from the environment so it never has to be written to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::vision::detection::{CONFIDENCE_THRESHOLD, OVERLAP_THRESHOLD};

/// Environment variables checked (in order) for the inference API key
pub const API_KEY_ENV_VARS: [&str; 2] = ["SCENTSCAN_API_KEY", "ROBOFLOW_API_KEY"];

/// Desktop browser User-Agent sent to the catalog site
const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3"
);

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Shared inference service settings
    pub services: ServicesConfig,
    /// Object detection settings
    pub detection: DetectionConfig,
    /// OCR settings
    pub ocr: OcrConfig,
    /// Fragrance catalog settings
    pub catalog: CatalogConfig,
    /// Catalog cache settings
    pub cache: CacheConfig,
    /// Upload storage settings
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Override settings from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
        {
            self.services.api_key = Some(key);
        }
    }

    /// The configured API key, if any
    pub fn api_key(&self) -> Option<String> {
        self.services
            .api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .cloned()
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: String,
    /// Maximum request body size in bytes (images arrive as data URLs)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Settings shared by the detection and OCR services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Inference API key
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Object detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Hosted detection endpoint
    pub endpoint: String,
    /// Model identifier (`project/version`)
    pub model_id: String,
    /// Minimum confidence in percent
    pub confidence_threshold: u8,
    /// Maximum overlap in percent
    pub overlap_threshold: u8,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://detect.roboflow.com".to_string(),
            model_id: "perfume-bottles/1".to_string(),
            confidence_threshold: CONFIDENCE_THRESHOLD,
            overlap_threshold: OVERLAP_THRESHOLD,
        }
    }
}

/// OCR settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Hosted OCR endpoint
    pub endpoint: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://infer.roboflow.com/doctr/ocr".to_string(),
        }
    }
}

/// Fragrance catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog site root
    pub base_url: String,
    /// User agent sent with catalog requests
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.fragrantica.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
        }
    }
}

/// Catalog cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached lookups (0 disables the cache)
    pub capacity: usize,
    /// Lifetime of a cached lookup in seconds
    pub ttl_secs: u64,
    /// Cache failed lookups too, so repeated misses don't hit the site
    pub cache_failures: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            ttl_secs: 3600,
            cache_failures: true,
        }
    }
}

/// Upload storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Keep a copy of every image sent to `/api/identify`
    pub save_captures: bool,
    /// Where captures go (defaults to `uploads/` in the data directory)
    pub uploads_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_captures: true,
            uploads_dir: None,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(config)
}

/// Load `explicit`, else `config.toml` in the config directory, else defaults.
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_dir) = crate::storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            let config = load_config(&config_path)?;
            info!("Loaded configuration from {:?}", config_path);
            return Ok(config);
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
