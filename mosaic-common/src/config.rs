//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Environment variable (highest)
//! 2. TOML config file
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database backing the relational fallback
    pub database_path: PathBuf,
    /// Remote media store settings
    pub media_store: MediaStoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("mosaic.db"),
            media_store: MediaStoreConfig::default(),
        }
    }
}

/// Remote media store settings
///
/// The store is the preferred source for gallery and figure data; the
/// per-section toggles gate it independently so one section can run
/// against the store while the other stays on the database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaStoreConfig {
    /// Base URL of the store's API (e.g. `https://api.example.com/v1/demo`)
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Serve the event gallery from the media store
    pub gallery_enabled: bool,
    /// Serve notable figures from the media store
    pub figures_enabled: bool,
    /// Root folder holding one subfolder per event
    pub gallery_folder: String,
    /// Root folder holding one subfolder per figure
    pub figures_folder: String,
    /// Use a named collection instead of folder inference for the gallery
    pub use_collection: bool,
    pub collection_name: String,
    /// Maximum results per search call (the engine never paginates past this)
    pub max_results: u32,
}

impl Default for MediaStoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_key: None,
            api_secret: None,
            gallery_enabled: false,
            figures_enabled: false,
            gallery_folder: "gallery".to_string(),
            figures_folder: "notable-figures".to_string(),
            use_collection: false,
            collection_name: "gallery".to_string(),
            max_results: 500,
        }
    }
}

impl MediaStoreConfig {
    /// All three credentials present. A missing credential makes the store
    /// "unavailable" rather than an error; callers fall through to the
    /// relational source.
    pub fn credentials_present(&self) -> bool {
        self.api_base_url.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }

    pub fn gallery_active(&self) -> bool {
        self.gallery_enabled && self.credentials_present()
    }

    pub fn figures_active(&self) -> bool {
        self.figures_enabled && self.credentials_present()
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply
    /// environment variable overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))?
            }
            Some(path) => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Config::default()
            }
            None => Config::default(),
        };

        config.apply_env();

        if config.media_store.gallery_enabled && !config.media_store.credentials_present() {
            tracing::warn!("Media store enabled for gallery but credentials incomplete");
        }
        if config.media_store.figures_enabled && !config.media_store.credentials_present() {
            tracing::warn!("Media store enabled for figures but credentials incomplete");
        }

        Ok(config)
    }

    /// Apply environment variable overrides on top of file/default values
    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("MOSAIC_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }

        let store = &mut self.media_store;
        if let Ok(url) = std::env::var("MOSAIC_MEDIA_API_URL") {
            store.api_base_url = Some(url);
        }
        if let Ok(key) = std::env::var("MOSAIC_MEDIA_API_KEY") {
            store.api_key = Some(key);
        }
        if let Ok(secret) = std::env::var("MOSAIC_MEDIA_API_SECRET") {
            store.api_secret = Some(secret);
        }
        if let Some(flag) = env_bool("MOSAIC_MEDIA_GALLERY") {
            store.gallery_enabled = flag;
        }
        if let Some(flag) = env_bool("MOSAIC_MEDIA_FIGURES") {
            store.figures_enabled = flag;
        }
        if let Some(flag) = env_bool("MOSAIC_MEDIA_COLLECTION") {
            store.use_collection = flag;
        }
        if let Ok(name) = std::env::var("MOSAIC_MEDIA_COLLECTION_NAME") {
            store.collection_name = name;
        }
    }
}

/// Parse a boolean environment variable ("true"/"1" = true, "false"/"0" = false)
fn env_bool(name: &str) -> Option<bool> {
    match std::env::var(name) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            other => {
                tracing::warn!(var = name, value = other, "Unrecognized boolean value, ignoring");
                None
            }
        },
        Err(_) => None,
    }
}
