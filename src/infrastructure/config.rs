use crate::domain::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_web_base")]
    pub web_base: String,
    /// Client id sent as `source=` to the API.
    #[serde(default = "default_source")]
    pub source: String,
    /// Client name sent to the welcome page.
    #[serde(default = "default_client")]
    pub client: String,
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,
    #[serde(default = "default_install_key")]
    pub install_key: String,
    #[serde(default = "default_discard_stale_renders")]
    pub discard_stale_renders: bool,
    pub http_proxy: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    pub database_path: Option<String>,
    #[serde(default)]
    pub icon: IconConfig,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IconConfig {
    #[serde(default = "default_asset_dir")]
    pub asset_dir: String,
    #[serde(default = "default_icon_sizes")]
    pub sizes: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: default_log_level(),
        }
    }
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            asset_dir: default_asset_dir(),
            sizes: default_icon_sizes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            web_base: default_web_base(),
            source: default_source(),
            client: default_client(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
            install_key: default_install_key(),
            discard_stale_renders: default_discard_stale_renders(),
            http_proxy: None,
            user_agent: default_user_agent(),
            database_path: None,
            icon: IconConfig::default(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    pub fn cache_ttl_ms(&self) -> i64 {
        (self.cache_ttl_minutes as i64).saturating_mul(60 * 1000)
    }

    /// Fail early on settings that would only surface as odd runtime behaviour.
    pub fn validate(&self) -> Result<(), ScoreError> {
        for (name, base) in [("api_base", &self.api_base), ("web_base", &self.web_base)] {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ScoreError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, base
                )));
            }
        }
        if self.install_key.is_empty() {
            return Err(ScoreError::Config("install_key must not be empty".to_string()));
        }
        if self.icon.sizes.is_empty() {
            return Err(ScoreError::Config(
                "icon.sizes needs at least one size".to_string(),
            ));
        }
        Ok(())
    }
}

// Defaults
fn default_api_base() -> String {
    "https://api.passmarked.com".to_string()
}
fn default_web_base() -> String {
    "https://passmarked.com".to_string()
}
fn default_source() -> String {
    "chrome.ext".to_string()
}
fn default_client() -> String {
    "chrome".to_string()
}
fn default_cache_ttl_minutes() -> u64 {
    60
}
fn default_install_key() -> String {
    "install".to_string()
}
fn default_discard_stale_renders() -> bool {
    true
}
fn default_user_agent() -> String {
    format!("scorelens/{}", env!("CARGO_PKG_VERSION"))
}
fn default_asset_dir() -> String {
    "assets".to_string()
}
fn default_icon_sizes() -> Vec<u32> {
    vec![19, 38]
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "WARN".to_string()
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("scorelens").join("config.toml"))
}

/// Get database path (config override, else the config directory)
pub fn get_database_path(config: &Config) -> PathBuf {
    if let Some(path) = config.database_path.as_deref().filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    // ~/.config/scorelens/scorelens.db (Linux)
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scorelens")
        .join("scorelens.db")
}

pub fn load_config() -> Result<Config, ScoreError> {
    match get_config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config, ScoreError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        match parse_config(&content) {
            Ok(config) => return Ok(config),
            Err(e) => {
                eprintln!(
                    "Warning: Failed to parse config file: {}. Using defaults.",
                    e
                );
            }
        }
    }

    Ok(Config::default())
}

pub fn parse_config(content: &str) -> Result<Config, ScoreError> {
    let config = toml::from_str::<Config>(content)?;
    config.validate()?;
    Ok(config)
}

pub fn generate_config_sample() -> Result<(), ScoreError> {
    let config_path = get_config_path();

    if let Some(path) = config_path {
        if path.exists() {
            eprintln!("Config file already exists at: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let sample = Config::default();
        let toml_content = toml::to_string_pretty(&sample)
            .map_err(|e| ScoreError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, toml_content)
            .map_err(|e| ScoreError::Config(format!("Failed to write config file: {}", e)))?;
        println!("Generated config file at: {}", path.display());
    } else {
        return Err(ScoreError::Config(
            "Cannot determine config directory".to_string(),
        ));
    }

    Ok(())
}
