//! Application configuration
//!
//! Handles loading and managing configuration from config.json and secrets.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::favorites::DuplicatePolicy;

/// Global application config
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Global secrets
static APP_SECRETS: OnceLock<AppSecrets> = OnceLock::new();

/// Get the global application config
pub fn get_config() -> &'static AppConfig {
    APP_CONFIG.get_or_init(AppConfig::load)
}

/// Get the global application secrets
pub fn get_secrets() -> &'static AppSecrets {
    APP_SECRETS.get_or_init(AppSecrets::load)
}

/// Root application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub apod: ApodConfig,
}

/// APOD service and local storage settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApodConfig {
    /// Metadata endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Directory holding downloaded images
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Newline-delimited favorites file
    #[serde(default = "default_favorites_file")]
    pub favorites_file: PathBuf,
    /// HTTP timeout in seconds, applied to both the metadata and image requests
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How the favorites store detects an existing entry
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_endpoint() -> String {
    "https://api.nasa.gov/planetary/apod".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("apod_images")
}

fn default_favorites_file() -> PathBuf {
    PathBuf::from("favorites.txt")
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApodConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            cache_dir: default_cache_dir(),
            favorites_file: default_favorites_file(),
            timeout_secs: default_timeout_secs(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config.json
    pub fn load() -> Self {
        match load_json::<Self>("config.json") {
            Some((config, path)) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            None => {
                log::info!("No config.json found, using defaults");
                Self::default()
            }
        }
    }
}

/// Application secrets (loaded from secrets.json)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppSecrets {
    #[serde(default)]
    pub nasa: NasaSecrets,
}

/// NASA API credentials
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NasaSecrets {
    /// api.nasa.gov key
    #[serde(default)]
    pub api_key: String,
}

impl AppSecrets {
    /// Load secrets from secrets.json, with NASA_API_KEY taking precedence
    pub fn load() -> Self {
        let mut secrets = match load_json::<Self>("secrets.json") {
            Some((secrets, path)) => {
                log::info!("Loaded secrets from {}", path.display());
                secrets
            }
            None => Self::default(),
        };

        if let Ok(key) = std::env::var("NASA_API_KEY") {
            if !key.trim().is_empty() {
                log::debug!("Using API key from NASA_API_KEY");
                secrets.nasa.api_key = key.trim().to_string();
            }
        }

        if secrets.nasa.api_key.is_empty() {
            log::info!("No NASA API key configured, it must be entered in the window");
        }
        secrets
    }
}

/// Look for `name` in the working directory, then next to the executable
fn load_json<T: for<'de> Deserialize<'de>>(name: &str) -> Option<(T, PathBuf)> {
    let mut candidates = vec![PathBuf::from(name)];
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join(name));
        }
    }

    candidates.into_iter().find_map(|path| match load_from_path(&path) {
        Ok(value) => Some((value, path)),
        Err(e) => {
            if path.exists() {
                log::warn!("Ignoring {}: {}", path.display(), e);
            }
            None
        }
    })
}

fn load_from_path<T: for<'de> Deserialize<'de>>(
    path: &std::path::Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)?;
    Ok(value)
}
